//! Genetic-algorithm request parameters and their form encoding.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParams {
    pub pop_size: u32,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub use_pmx: bool,
    pub use_ox: bool,
    pub use_elitism: bool,
    pub fitness_threshold: Option<f64>,
    pub no_improvement_generations: u32,
    /// Ant-colony tuning, forwarded untouched when set.
    pub pheromone_threshold: Option<f64>,
    /// Simulated-annealing tuning, forwarded untouched when set.
    pub initial_temp: Option<f64>,
    pub cooling_rate: Option<f64>,
    pub num_iterations: Option<u32>,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            pop_size: 100,
            mutation_rate: 0.01,
            crossover_rate: 0.7,
            use_pmx: false,
            use_ox: true,
            use_elitism: false,
            fitness_threshold: None,
            no_improvement_generations: 20,
            pheromone_threshold: None,
            initial_temp: None,
            cooling_rate: None,
            num_iterations: None,
        }
    }
}

pub const PARAMETER_NAMES: &[&str] = &[
    "pop_size",
    "mutation_rate",
    "crossover_rate",
    "use_pmx",
    "use_ox",
    "use_elitism",
    "fitness_threshold",
    "no_improvement_generations",
    "pheromone_threshold",
    "initial_temp",
    "cooling_rate",
    "num_iterations",
];

impl GeneticParams {
    /// Applies `key=value` overrides in order; later keys win.
    pub fn with_overrides<I, S>(mut self, overrides: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in overrides {
            let raw = raw.as_ref();
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| ConfigurationError::MalformedOverride(raw.to_string()))?;
            self.set(key.trim(), value.trim())?;
        }
        Ok(self)
    }

    /// Sets one parameter from its textual form value. An empty value clears
    /// optional parameters.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigurationError> {
        match key {
            "pop_size" => self.pop_size = parse_int("pop_size", value)?,
            "mutation_rate" => self.mutation_rate = parse_float("mutation_rate", value)?,
            "crossover_rate" => self.crossover_rate = parse_float("crossover_rate", value)?,
            "use_pmx" => self.use_pmx = parse_bool("use_pmx", value)?,
            "use_ox" => self.use_ox = parse_bool("use_ox", value)?,
            "use_elitism" => self.use_elitism = parse_bool("use_elitism", value)?,
            "fitness_threshold" => {
                self.fitness_threshold = parse_optional("fitness_threshold", value, parse_float)?
            }
            "no_improvement_generations" => {
                self.no_improvement_generations = parse_int("no_improvement_generations", value)?
            }
            "pheromone_threshold" => {
                self.pheromone_threshold =
                    parse_optional("pheromone_threshold", value, parse_float)?
            }
            "initial_temp" => {
                self.initial_temp = parse_optional("initial_temp", value, parse_float)?
            }
            "cooling_rate" => {
                self.cooling_rate = parse_optional("cooling_rate", value, parse_float)?
            }
            "num_iterations" => {
                self.num_iterations = parse_optional("num_iterations", value, parse_int)?
            }
            other => return Err(ConfigurationError::UnknownParameter(other.to_string())),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.pop_size == 0 {
            return Err(out_of_range("pop_size", self.pop_size, "at least 1"));
        }
        check_probability("mutation_rate", self.mutation_rate)?;
        check_probability("crossover_rate", self.crossover_rate)?;
        if let Some(threshold) = self.fitness_threshold {
            check_finite("fitness_threshold", threshold)?;
        }
        if let Some(threshold) = self.pheromone_threshold {
            check_finite("pheromone_threshold", threshold)?;
        }
        if let Some(temp) = self.initial_temp {
            if !temp.is_finite() || temp <= 0.0 {
                return Err(out_of_range("initial_temp", temp, "greater than 0"));
            }
        }
        if let Some(rate) = self.cooling_rate {
            if !rate.is_finite() || rate <= 0.0 || rate >= 1.0 {
                return Err(out_of_range("cooling_rate", rate, "between 0 and 1, exclusive"));
            }
        }
        Ok(())
    }

    /// Multipart text fields in the order the solver form lists them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("pop_size", self.pop_size.to_string()),
            ("mutation_rate", self.mutation_rate.to_string()),
            ("crossover_rate", self.crossover_rate.to_string()),
            ("use_pmx", self.use_pmx.to_string()),
            ("use_ox", self.use_ox.to_string()),
            ("use_elitism", self.use_elitism.to_string()),
            (
                "fitness_threshold",
                self.fitness_threshold
                    .map(|value| value.to_string())
                    .unwrap_or_default(),
            ),
            (
                "no_improvement_generations",
                self.no_improvement_generations.to_string(),
            ),
        ];
        let optional = [
            ("pheromone_threshold", self.pheromone_threshold.map(|v| v.to_string())),
            ("initial_temp", self.initial_temp.map(|v| v.to_string())),
            ("cooling_rate", self.cooling_rate.map(|v| v.to_string())),
            ("num_iterations", self.num_iterations.map(|v| v.to_string())),
        ];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|value| (name, value))),
        );
        fields
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<u32, ConfigurationError> {
    value.parse().map_err(|_| ConfigurationError::NotANumber {
        field,
        value: value.to_string(),
    })
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, ConfigurationError> {
    let parsed: f64 = value.parse().map_err(|_| ConfigurationError::NotANumber {
        field,
        value: value.to_string(),
    })?;
    check_finite(field, parsed)?;
    Ok(parsed)
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, ConfigurationError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::NotABool {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_optional<T>(
    field: &'static str,
    value: &str,
    parse: fn(&'static str, &str) -> Result<T, ConfigurationError>,
) -> Result<Option<T>, ConfigurationError> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse(field, value).map(Some)
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(out_of_range(field, value, "a finite number"))
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(field, value, "between 0 and 1"))
    }
}

fn out_of_range(
    field: &'static str,
    value: impl ToString,
    expected: &'static str,
) -> ConfigurationError {
    ConfigurationError::OutOfRange {
        field,
        value: value.to_string(),
        expected,
    }
}
