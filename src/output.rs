use std::io::Write as _;
use std::path::PathBuf;

use csv_core::WriteResult;

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Format {
    Table,
    Jsonl,
    Csv,
}

#[derive(clap::Parser)]
#[group(id = "output::Args")]
pub struct Args {
    /// Write to this file instead of the standard output.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    #[arg(long, short='f', value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open the specified output file at {1:?}")]
    OpenOutputFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the output file at {1:?}")]
    WriteFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the terminal")]
    WriteStdout(#[source] std::io::Error),
    #[error("could not serialize the row to JSON")]
    SerializeJson(#[source] serde_json::Error),
    #[error("could not encode the row as CSV")]
    SerializeCsv,
}

/// Something that can be printed as one line of output.
pub trait Row: serde::Serialize {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl Args {
    pub fn to_output(self) -> Result<Output, Error> {
        let io = match &self.output {
            None => Box::new(std::io::stdout().lock()) as Box<_>,
            Some(path) => Box::new(
                std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| Error::OpenOutputFile(e, path.clone()))?,
            ) as Box<_>,
        };
        Ok(Output::new(io, self.format, self.output))
    }
}

pub struct Output {
    path: Option<PathBuf>,
    io: Box<dyn std::io::Write>,
    formatter: Formatter,
}

enum Formatter {
    Csv { wrote_headers: bool },
    Table { comfy: comfy_table::Table, wrote_headers: bool },
    Jsonl,
}

impl Output {
    /// `path` only names the destination in error messages.
    pub fn new(io: Box<dyn std::io::Write>, format: Format, path: Option<PathBuf>) -> Self {
        let formatter = match format {
            Format::Table => {
                let mut comfy = comfy_table::Table::new();
                comfy.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
                Formatter::Table { comfy, wrote_headers: false }
            }
            Format::Jsonl => Formatter::Jsonl,
            Format::Csv => Formatter::Csv { wrote_headers: false },
        };
        Self { path, io, formatter }
    }

    pub fn row<R: Row>(&mut self, row: &R) -> Result<(), Error> {
        match &mut self.formatter {
            Formatter::Csv { wrote_headers } => {
                if !*wrote_headers {
                    *wrote_headers = true;
                    self.write_csv_row(R::HEADERS)?;
                }
                self.write_csv_row(&row.cells())?;
            }
            Formatter::Table { comfy, wrote_headers } => {
                if !*wrote_headers {
                    *wrote_headers = true;
                    comfy.set_header(R::HEADERS.to_vec());
                }
                comfy.add_row(row.cells());
            }
            Formatter::Jsonl => {
                serde_json::to_writer(&mut self.io, row).map_err(Error::SerializeJson)?;
                writeln!(self.io).map_err(|e| self.write_error(e))?
            }
        }
        Ok(())
    }

    fn write_csv_row<V: AsRef<str>>(&mut self, values: &[V]) -> Result<(), Error> {
        // Worst case every byte is a quote that needs doubling, plus the surrounding quotes.
        let max_len = 2 + 2 * values.iter().map(|v| v.as_ref().len()).max().unwrap_or(0);
        let mut output = vec![0; max_len];
        let mut writer = csv_core::Writer::new();
        let mut line = Vec::new();
        for (index, value) in values.iter().enumerate() {
            if index != 0 {
                let (WriteResult::InputEmpty, ob) = writer.delimiter(&mut output) else {
                    return Err(Error::SerializeCsv);
                };
                line.extend_from_slice(&output[..ob]);
            }
            let input = value.as_ref().as_bytes();
            let (WriteResult::InputEmpty, ib, ob) = writer.field(input, &mut output) else {
                return Err(Error::SerializeCsv);
            };
            if ib != input.len() {
                return Err(Error::SerializeCsv);
            }
            line.extend_from_slice(&output[..ob]);
        }
        let (WriteResult::InputEmpty, ob) = writer.terminator(&mut output) else {
            return Err(Error::SerializeCsv);
        };
        line.extend_from_slice(&output[..ob]);
        self.io.write_all(&line).map_err(|e| self.write_error(e))
    }

    fn write_error(&self, e: std::io::Error) -> Error {
        match &self.path {
            None => Error::WriteStdout(e),
            Some(p) => Error::WriteFile(e, p.into()),
        }
    }

    pub fn commit(mut self) -> Result<(), Error> {
        match &self.formatter {
            Formatter::Csv { .. } | Formatter::Jsonl => {}
            Formatter::Table { comfy, .. } => {
                writeln!(self.io, "{comfy}").map_err(|e| self.write_error(e))?;
            }
        }
        self.io.flush().map_err(|e| self.write_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(serde::Serialize)]
    struct Pair {
        name: &'static str,
        value: u16,
    }

    impl Row for Pair {
        const HEADERS: &'static [&'static str] = &["Name", "Value"];
        fn cells(&self) -> Vec<String> {
            vec![self.name.to_string(), self.value.to_string()]
        }
    }

    fn render(format: Format, rows: &[Pair]) -> String {
        let shared = Shared::default();
        let mut output = Output::new(Box::new(shared.clone()), format, None);
        for row in rows {
            output.row(row).unwrap();
        }
        output.commit().unwrap();
        let bytes = shared.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    const ROWS: &[Pair] = &[Pair { name: "a,b", value: 1 }, Pair { name: "say \"hi\"", value: 2 }];

    #[test]
    fn csv_quotes_fields() {
        assert_eq!(
            render(Format::Csv, ROWS),
            "Name,Value\n\"a,b\",1\n\"say \"\"hi\"\"\",2\n"
        );
    }

    #[test]
    fn jsonl_one_object_per_line() {
        assert_eq!(
            render(Format::Jsonl, ROWS),
            "{\"name\":\"a,b\",\"value\":1}\n{\"name\":\"say \\\"hi\\\"\",\"value\":2}\n"
        );
    }

    #[test]
    fn table_has_headers() {
        let table = render(Format::Table, ROWS);
        assert!(table.contains("Name"));
        assert!(table.contains("a,b"));
    }
}
