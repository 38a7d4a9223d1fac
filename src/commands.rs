pub mod registers {
    use crate::output::{self, Row};
    use crate::registers::{METRICS, Metric};

    /// Search and output the known metrics and the registers they are decoded from.
    #[derive(clap::Parser)]
    pub struct Args {
        /// Only list metrics whose name, description or address contain this text.
        filter: Option<String>,
        #[clap(flatten)]
        output: output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not output the metric catalogue")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct MetricSchema {
        pub address: u16,
        pub name: &'static str,
        pub rule: String,
        pub unit: &'static str,
        pub description: &'static str,
    }

    impl MetricSchema {
        pub fn new(metric: &Metric) -> Self {
            Self {
                address: metric.address,
                name: metric.name,
                rule: metric.data_type.to_string(),
                unit: metric.unit,
                description: metric.description,
            }
        }

        pub fn is_match(&self, pattern: &str) -> bool {
            let pattern = pattern.to_lowercase();
            self.name.contains(&pattern)
                || self.description.to_lowercase().contains(&pattern)
                || format!("{:#06x}", self.address).contains(&pattern)
        }
    }

    impl Row for MetricSchema {
        const HEADERS: &'static [&'static str] = &["Address", "Name", "Rule", "Unit", "Description"];
        fn cells(&self) -> Vec<String> {
            vec![
                format!("{:#06X}", self.address),
                self.name.to_string(),
                self.rule.clone(),
                self.unit.to_string(),
                self.description.to_string(),
            ]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let mut output = args.output.to_output()?;
        for schema in METRICS.iter().map(MetricSchema::new) {
            if let Some(pattern) = &args.filter {
                if !schema.is_match(pattern) {
                    continue;
                }
            }
            output.row(&schema)?;
        }
        Ok(output.commit()?)
    }
}

pub mod read {
    use crate::connection;
    use crate::controller::{self, RoverController};
    use crate::output::{self, Row};
    use crate::registers::{METRICS, Metric, Value};
    use tracing::info;

    /// Read metrics from the charge controller and output their decoded values.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        connection: connection::Args,
        #[clap(flatten)]
        output: output::Args,
        /// Names of the metrics to read, see the `registers` command. Reads all when omitted.
        metrics: Vec<String>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("there is no metric named `{0}`")]
        UnknownMetric(String),
        #[error("could not connect to the charge controller")]
        Connect(#[source] connection::Error),
        #[error("could not set up the charge controller")]
        Controller(#[source] controller::Error<connection::Error>),
        #[error("could not read `{1}`")]
        Read(#[source] controller::Error<connection::Error>, &'static str),
        #[error("could not output the readings")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct Reading {
        pub metric: &'static str,
        pub address: u16,
        pub value: Value,
        pub unit: &'static str,
    }

    impl Row for Reading {
        const HEADERS: &'static [&'static str] = &["Metric", "Address", "Value", "Unit"];
        fn cells(&self) -> Vec<String> {
            vec![
                self.metric.to_string(),
                format!("{:#06X}", self.address),
                self.value.to_string(),
                self.unit.to_string(),
            ]
        }
    }

    pub fn selected_metrics(names: &[String]) -> Result<Vec<&'static Metric>, Error> {
        if names.is_empty() {
            return Ok(METRICS.iter().collect());
        }
        names
            .iter()
            .map(|name| Metric::from_name(name).ok_or_else(|| Error::UnknownMetric(name.clone())))
            .collect()
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let metrics = selected_metrics(&args.metrics)?;
        let source = args.connection.connect().map_err(Error::Connect)?;
        let mut controller = RoverController::new(source).map_err(Error::Controller)?;
        let mut output = args.output.to_output()?;
        for metric in metrics {
            let value = controller.read(metric).map_err(|e| Error::Read(e, metric.name))?;
            info!(message = "read", metric = metric.name, %value);
            output.row(&Reading {
                metric: metric.name,
                address: metric.address,
                value,
                unit: metric.unit,
            })?;
        }
        Ok(output.commit()?)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn selects_metrics_by_name() {
            assert_eq!(selected_metrics(&[]).unwrap().len(), METRICS.len());
            let names = vec!["charging_power".to_string(), "battery_type".to_string()];
            let selected = selected_metrics(&names).unwrap();
            assert_eq!(selected[0].address, 0x0109);
            assert_eq!(selected[1].address, 0xE004);
            let names = vec!["flux_capacitor".to_string()];
            assert!(matches!(selected_metrics(&names), Err(Error::UnknownMetric(n)) if n == "flux_capacitor"));
        }
    }
}
