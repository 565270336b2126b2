use crate::cli::output::*;
use crate::tools::{Tool, ToolRunner};
use clap::Args;
use comfy_table::{Cell, Color};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ToolsArgs {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE", env = "FIDO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Serialize)]
struct ToolStatus {
    tool: Tool,
    program: PathBuf,
    resolved: Option<PathBuf>,
}

pub fn run(args: ToolsArgs) -> anyhow::Result<()> {
    let config = super::resolve_config(args.config.as_deref())?;
    let runner = ToolRunner::from_config(&config.tools);

    let statuses: Vec<ToolStatus> = Tool::ALL
        .iter()
        .map(|tool| {
            let program = tool.program(&config.tools);
            let resolved = runner.verify(*tool, &program).ok();
            ToolStatus {
                tool: *tool,
                program,
                resolved,
            }
        })
        .collect();

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&statuses)?),
        _ => {
            let mut table = create_standard_table();
            table.set_header(vec![
                header_cell("Tool"),
                header_cell("Configured"),
                header_cell("Status"),
                header_cell("Resolved path"),
            ]);
            for status in &statuses {
                let (state, path) = match &status.resolved {
                    Some(path) => (Cell::new("found").fg(Color::Green), path.display().to_string()),
                    None => (Cell::new("missing").fg(Color::Red), String::new()),
                };
                table.add_row(vec![
                    Cell::new(status.tool.display_name()),
                    Cell::new(status.program.display().to_string()),
                    state,
                    Cell::new(path),
                ]);
            }

            section_header("External Tools");
            println!("{}", table);

            let missing = statuses.iter().filter(|s| s.resolved.is_none()).count();
            if missing == 0 {
                success("All external tools are available");
            } else {
                warning(&format!(
                    "{} of {} tools missing; set their locations in the [tools] config section",
                    missing,
                    statuses.len()
                ));
            }
        }
    }
    Ok(())
}
