//! Interactive session - free-form commands plus `:`-prefixed controls.

use std::io::{self, Write};
use sysgate_core::{FreeFormRequest, Gateway, GatewayError};
use sysgate_executor::CommandRunner;
use sysgate_interpreter::{ResultShape, SortDirection};

use crate::history::{History, HistoryEntry, HistoryFilter};
use crate::render::{self, Renderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplAction {
    Print(String),
    Quit,
}

pub struct Repl<'a, R: CommandRunner> {
    gateway: &'a Gateway<R>,
    renderer: Renderer,
    history: History,
}

impl<'a, R: CommandRunner> Repl<'a, R> {
    pub fn new(gateway: &'a Gateway<R>, renderer: Renderer) -> Self {
        Self {
            gateway,
            renderer,
            history: History::new(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub async fn run(&mut self) -> io::Result<()> {
        println!("sysgate - read-only system inspection");
        println!("Type a command, or :help for controls");
        println!();

        loop {
            print!("sysgate> ");
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }

            match self.handle_line(&input).await {
                ReplAction::Print(text) if text.is_empty() => {}
                ReplAction::Print(text) => println!("{}", text.trim_end()),
                ReplAction::Quit => break,
            }
        }
        Ok(())
    }

    pub async fn handle_line(&mut self, line: &str) -> ReplAction {
        let line = line.trim();
        if line.is_empty() {
            return ReplAction::Print(String::new());
        }

        let Some(control) = line.strip_prefix(':') else {
            return ReplAction::Print(self.free_form(line).await);
        };

        let mut parts = control.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        match verb {
            "quit" | "q" | "exit" => ReplAction::Quit,
            "help" => ReplAction::Print(help()),
            "metric" => match args.first() {
                Some(name) => ReplAction::Print(self.metric(name).await),
                None => ReplAction::Print("Usage: :metric NAME".to_string()),
            },
            "catalog" => ReplAction::Print(render::catalog(self.gateway.catalog().entries())),
            "history" => ReplAction::Print(self.show_history(&args)),
            "sort" => ReplAction::Print(self.sort(&args)),
            other => ReplAction::Print(format!("Unknown control :{} (try :help)", other)),
        }
    }

    async fn free_form(&mut self, command: &str) -> String {
        match self
            .gateway
            .run_free_form(FreeFormRequest::new(command, command))
            .await
        {
            Ok(result) => {
                let rendered = self.renderer.result(&result);
                self.history.record(HistoryEntry::new(result));
                rendered
            }
            Err(e) => self.failed(command, command, &e),
        }
    }

    async fn metric(&mut self, name: &str) -> String {
        match self.gateway.run_metric(name).await {
            Ok(report) => {
                let rendered = self.renderer.metric(&report);
                self.history.record(HistoryEntry::new(report.result));
                rendered
            }
            Err(e) => self.failed(name, "", &e),
        }
    }

    fn failed(&mut self, query: &str, command: &str, error: &GatewayError) -> String {
        let mut message = error.to_string();
        if let Some(stderr) = error.stderr().filter(|s| !s.is_empty()) {
            message.push('\n');
            message.push_str(stderr);
        }
        self.history
            .record(HistoryEntry::failed(query, command, &message));
        format!("error: {}", message)
    }

    fn show_history(&self, args: &[&str]) -> String {
        let (filter, search) = match args.first().map(|a| a.parse::<HistoryFilter>()) {
            Some(Ok(filter)) => (filter, args.get(1..).map(|rest| rest.join(" "))),
            Some(Err(_)) => (HistoryFilter::All, Some(args.join(" "))),
            None => (HistoryFilter::All, None),
        };
        let search = search.filter(|s| !s.is_empty());

        let entries = self.history.filter(filter, search.as_deref());
        if entries.is_empty() {
            return "No history entries".to_string();
        }
        entries
            .iter()
            .map(|entry| {
                format!(
                    "{}  {:<7}  {}  {}\n",
                    entry.timestamp.format("%H:%M:%S"),
                    entry.status().label(),
                    entry.result.query,
                    entry.result.command
                )
            })
            .collect()
    }

    fn sort(&mut self, args: &[&str]) -> String {
        let Some(column) = args.first() else {
            return "Usage: :sort COLUMN [asc|desc]".to_string();
        };
        let direction = match args.get(1).map(|d| d.parse::<SortDirection>()) {
            Some(Ok(direction)) => direction,
            Some(Err(e)) => return e,
            None => SortDirection::Ascending,
        };

        let Some(entry) = self.history.latest_mut() else {
            return "Nothing to sort yet".to_string();
        };
        if entry.result.result_shape != ResultShape::Table {
            return "Last result is not a table".to_string();
        }
        let Some(index) = render::column_index(&entry.result.columns, column) else {
            return format!("No column {}", column);
        };
        entry.result.sort_by_column(index, direction);
        self.renderer.result(&entry.result)
    }
}

fn help() -> String {
    [
        "Controls:",
        "  :metric NAME                 run a catalog metric",
        "  :catalog                     list catalog metrics",
        "  :history [FILTER] [SEARCH]   all, success, error or blocked",
        "  :sort COLUMN [asc|desc]      re-sort the last table",
        "  :quit                        leave",
        "Anything else is run as a read-only command.",
    ]
    .join("\n")
}
