use anyhow::{Result, bail};
use comfy_table::{Cell, Table};
use keyward_core::admin::{self, EndpointReport, EndpointStatus};

use crate::output::{OutputFormat, json::print_json, table::print_table};
use crate::setup::Session;

pub async fn run(session: &Session, paths: Vec<String>, format: OutputFormat) -> Result<()> {
    let explicit = !paths.is_empty();
    let endpoints = if explicit {
        paths.iter().map(|p| session.config.endpoint(p)).collect::<Vec<_>>()
    } else {
        session.config.endpoints()
    };

    if endpoints.is_empty() {
        if format.is_json() {
            return print_json(&Vec::<EndpointReport>::new());
        }
        println!("No paths defined. Add a [paths] section or pass a URL: keyward check https://...");
        return Ok(());
    }

    let reports = admin::check(&session.resolver, &endpoints, explicit).await;
    let failed = reports.iter().filter(|r| r.status.is_failure()).count();

    if format.is_json() {
        print_json(&reports)?;
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Name", "Password", "Source", "User", "URL"]);
        for report in &reports {
            table.add_row(row(report));
        }
        print_table(table)?;
    }

    if explicit && failed > 0 {
        bail!("{} of {} paths could not be checked", failed, reports.len());
    }
    Ok(())
}

fn row(report: &EndpointReport) -> Vec<Cell> {
    let name = Cell::new(&report.endpoint.name);
    match &report.status {
        EndpointStatus::NonHttp => vec![
            name,
            Cell::new("non-http path"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(&report.endpoint.url),
        ],
        EndpointStatus::Available {
            source,
            username,
            scope_url,
        } => vec![
            name,
            Cell::new("available"),
            Cell::new(source.to_string()),
            Cell::new(username.as_deref().unwrap_or("-")),
            Cell::new(scope_url),
        ],
        EndpointStatus::UserOnly {
            username,
            scope_url,
        } => vec![
            name,
            Cell::new("not saved"),
            Cell::new("-"),
            Cell::new(username),
            Cell::new(scope_url),
        ],
        EndpointStatus::Unknown { scope_url } => vec![
            name,
            Cell::new("not saved, user unknown"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(scope_url),
        ],
        EndpointStatus::Failed { message } => vec![
            name,
            Cell::new(format!("error: {message}")),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(&report.endpoint.url),
        ],
    }
}
