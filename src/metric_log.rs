//! Tab-separated log of per-iteration metrics
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// A table of named metrics written one record per line.
///
/// Fields are declared with a default value before the first record; the header is written
/// together with the first record. Values that are not set for a record fall back to the default.
pub struct MetricLog {
    out: Box<dyn Write>,
    fields: Vec<String>,
    defaults: Vec<f64>,
    values: Vec<f64>,
    index: HashMap<String, usize>,
    started: bool,
}

impl MetricLog {
    /// Creates a log writing to the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        Ok(MetricLog::new(BufWriter::new(file)))
    }

    /// Creates a log writing to `out`.
    pub fn new(out: impl Write + 'static) -> Self {
        MetricLog {
            out: Box::new(out),
            fields: Vec::new(),
            defaults: Vec::new(),
            values: Vec::new(),
            index: HashMap::new(),
            started: false,
        }
    }

    /// Declares a field. Fails if the field exists or records were already written.
    pub fn add_field(&mut self, name: &str, default: f64) -> Result<()> {
        if self.started {
            return Err(Error::Configuration(format!(
                "field {name} declared after the first record"
            )));
        }
        if self.index.contains_key(name) {
            return Err(Error::Configuration(format!("the field {name} already exists")));
        }
        self.index.insert(name.to_owned(), self.fields.len());
        self.fields.push(name.to_owned());
        self.defaults.push(default);
        self.values.push(default);
        Ok(())
    }

    /// Declares a field unless it exists already.
    pub fn ensure_field(&mut self, name: &str, default: f64) -> Result<()> {
        if self.has_field(name) {
            return Ok(());
        }
        self.add_field(name, default)
    }

    /// Checks whether a field was declared.
    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the declared fields in column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Sets the value of a field for the current record. Unknown fields are ignored.
    pub fn set(&mut self, name: &str, value: f64) {
        if let Some(&i) = self.index.get(name) {
            self.values[i] = value;
        }
    }

    /// Writes the current record and resets all values to their defaults.
    pub fn new_line(&mut self) -> Result<()> {
        if !self.started {
            writeln!(self.out, "{}", self.fields.join("\t"))?;
            self.started = true;
        }
        let line: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        writeln!(self.out, "{}", line.join("\t"))?;
        self.out.flush()?;
        self.values.clone_from(&self.defaults);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn writes_header_once_and_resets_values() {
        let file = NamedTempFile::new().unwrap();
        let mut log = MetricLog::create(file.path()).unwrap();
        log.add_field("rmse", f64::NAN).unwrap();
        log.add_field("time_learn", 0.0).unwrap();
        log.set("rmse", 0.5);
        log.set("time_learn", 2.0);
        log.new_line().unwrap();
        log.set("time_learn", 1.5);
        log.new_line().unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text, "rmse\ttime_learn\n0.5\t2\nNaN\t1.5\n");
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let mut log = MetricLog::new(std::io::sink());
        log.add_field("mae", 0.0).unwrap();
        assert!(matches!(log.add_field("mae", 1.0), Err(Error::Configuration(_))));
        assert!(log.ensure_field("mae", 1.0).is_ok());
        assert_eq!(log.fields(), &["mae".to_owned()]);
    }

    #[test]
    fn fields_are_fixed_after_first_record() {
        let mut log = MetricLog::new(std::io::sink());
        log.add_field("accuracy", 0.0).unwrap();
        log.new_line().unwrap();
        assert!(matches!(
            log.add_field("log_loss", 0.0),
            Err(Error::Configuration(_))
        ));
    }
}
