use colored::Colorize;
use serde::Serialize;

use crate::cli::report::{format_linked, format_transactions};
use crate::cli::{open_store, print_json};
use crate::error::Result;
use crate::linker::{run_linking, KindSummary, LinkSummary};
use crate::reports::{link_report, LinkReport};

#[derive(Serialize)]
struct LinkOutput {
    summary: LinkSummary,
    #[serde(flatten)]
    report: LinkReport,
}

fn summary_line(label: &str, s: &KindSummary) -> String {
    let linked = format!("{} linked", s.linked);
    format!(
        "{label}: {}, {} unmatched, {} excluded",
        if s.linked > 0 { linked.green() } else { linked.normal() },
        s.unmatched,
        s.excluded
    )
}

pub fn run(json: bool) -> Result<()> {
    let store = open_store()?;
    let summary = run_linking(&store)?;
    let report = link_report(&store)?;

    if json {
        print_json(&LinkOutput { summary, report })?;
    } else {
        println!("{}", summary_line("Bills", &summary.bills));
        println!("{}", summary_line("Invoices", &summary.invoices));
        println!();
        println!("{}", format_transactions(&report.transactions));
        println!();
        println!("{}", format_linked("Linked bills", &report.bills));
        println!();
        println!("{}", format_linked("Linked invoices", &report.invoices));
    }
    store.close()
}
