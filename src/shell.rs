// 💬 Interactive shell
// Read-eval loop: "1" exports the report, "exit" quits, anything else searches

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

use crate::catalog::Catalog;
use crate::report::ReportExporter;
use crate::search::SearchResults;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Export,
    Exit,
    Search(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        match line {
            "1" => Command::Export,
            "exit" => Command::Exit,
            text => Command::Search(text.to_string()),
        }
    }
}

const MENU: &str = "\
Выберите действие:
Чтобы выгрузить все позиции в файл, введите - 1
Чтобы выйти введите - exit
Введите наименование продукции, чтобы найти:
----------------------------------------------------------------
";

pub struct Shell<'a> {
    exporter: ReportExporter<'a>,
    catalog: &'a Catalog,
    output_path: PathBuf,
}

impl<'a> Shell<'a> {
    pub fn new(catalog: &'a Catalog, output_path: PathBuf) -> Self {
        Shell {
            exporter: ReportExporter::new(catalog),
            catalog,
            output_path,
        }
    }

    /// Serve commands from `input` until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, out: &mut W) -> Result<()> {
        let mut line = String::new();

        loop {
            write!(out, "{}Ваш выбор: ", MENU)?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            let text = line.trim_end_matches(['\n', '\r']);

            match Command::parse(text) {
                Command::Exit => return Ok(()),
                Command::Export => self.export(out)?,
                Command::Search(query) => {
                    let results = SearchResults::run(self.catalog, &query);
                    writeln!(out, "{}", results.render())?;
                }
            }
        }
    }

    fn export<W: Write>(&self, out: &mut W) -> Result<()> {
        match self.exporter.export_to(&self.output_path) {
            Ok(path) => writeln!(out, "Файл {} создан.", path.display())?,
            Err(err) => {
                warn!(error = %err, "report export failed");
                writeln!(out, "Не удалось сохранить отчёт: {}", err)?;
            }
        }
        Ok(())
    }
}
