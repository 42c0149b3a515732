use std::io::{self, BufRead, Write};

use cpm_planner::{
    Constraint, ConstraintType, Project, RelationType, ResourceKind, ScheduleReport, ScheduleResult,
    TaskId, TaskSpec, TimeValue,
};
use polars::prelude::{AnyValue, DataFrame};
use tracing_subscriber::EnvFilter;

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::Boolean(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row| {
            columns
                .iter()
                .map(|col| col.get(row).map(|v| cell_text(&v)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = names.iter().map(String::len).collect();
    for row in &cells {
        for (ci, text) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(text.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let line = |values: &[String]| {
        let mut out = String::from("|");
        for (ci, text) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(text);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(text.len())));
            out.push_str(" |");
        }
        out
    };

    let mut out = format!("{sep}\n{}\n{sep}\n", line(&names));
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                         Show this help\n  show                                         Show the schedule report\n  task <name> <duration_days> [parent_id]      Add a task\n  milestone <name> [parent_id]                 Add a milestone\n  link <pred> <succ> [FS|SS|FF|SF] [lag_hours] Add a relation\n  unlink <pred> <succ>                         Remove a relation\n  resource <name> <cost_per_hour>              Add a work resource\n  assign <resource> <task> <units>             Assign a resource (units in percent)\n  constraint <task> <asap|alap|snet|mso|fnlt> [YYYYMMDD]\n                                               Set a task constraint\n  remove <task>                                Remove a task and its subtree\n  start <YYYYMMDD>                             Set the project start\n  holiday <YYYYMMDD>                           Mark a non-working day on the project calendar\n  compute                                      Reschedule now\n  critical                                     List the critical path\n  cost <task>                                  Show the cost of a task\n  batch begin|end                              Group changes into one reschedule\n  export <json|csv> <path>                     Write the schedule report\n  quit|exit                                    Exit"
    );
}

fn parse_task(raw: Option<&str>) -> Result<TaskId, String> {
    raw.and_then(|s| s.parse::<u32>().ok())
        .map(TaskId::from_raw)
        .ok_or_else(|| "Invalid task id".to_string())
}

fn parse_time(raw: Option<&str>) -> Result<TimeValue, String> {
    raw.ok_or_else(|| "Missing date".to_string())?
        .parse::<TimeValue>()
        .map_err(|e| e.to_string())
}

fn show(project: &mut Project) -> ScheduleResult<String> {
    let report = ScheduleReport::from_project(project)?;
    Ok(render_df_as_text_table(&report.to_dataframe()?))
}

fn run_command(project: &mut Project, cmd: &str, args: &[&str]) -> Result<String, String> {
    let err = |e: cpm_planner::ScheduleError| e.to_string();
    match cmd {
        "show" => show(project).map_err(err),
        "task" => {
            let (Some(name), Some(days)) = (args.first(), args.get(1)) else {
                return Err("Usage: task <name> <duration_days> [parent_id]".into());
            };
            let days: i64 = days.parse().map_err(|_| "Invalid duration_days".to_string())?;
            let parent = match args.get(2) {
                Some(raw) => parse_task(Some(raw))?,
                None => project.root(),
            };
            let id = project
                .insert_child(parent, None, TaskSpec::new(*name).duration_days(days))
                .map_err(err)?;
            Ok(format!("Added task {id}."))
        }
        "milestone" => {
            let Some(name) = args.first() else {
                return Err("Usage: milestone <name> [parent_id]".into());
            };
            let parent = match args.get(1) {
                Some(raw) => parse_task(Some(raw))?,
                None => project.root(),
            };
            let id = project
                .insert_child(parent, None, TaskSpec::milestone(*name))
                .map_err(err)?;
            Ok(format!("Added milestone {id}."))
        }
        "link" => {
            let pred = parse_task(args.first().copied())?;
            let succ = parse_task(args.get(1).copied())?;
            let relation_type = match args.get(2) {
                Some(raw) => raw.parse::<RelationType>().map_err(err)?,
                None => RelationType::FS,
            };
            let lag_hours: i64 = match args.get(3) {
                Some(raw) => raw.parse().map_err(|_| "Invalid lag_hours".to_string())?,
                None => 0,
            };
            project
                .add_predecessor(succ, pred, relation_type, lag_hours * 3600)
                .map_err(err)?;
            Ok(format!("Linked {pred} -> {succ} ({relation_type})."))
        }
        "unlink" => {
            let pred = parse_task(args.first().copied())?;
            let succ = parse_task(args.get(1).copied())?;
            project.remove_predecessor(succ, pred).map_err(err)?;
            Ok(format!("Unlinked {pred} -> {succ}."))
        }
        "resource" => {
            let (Some(name), Some(rate)) = (args.first(), args.get(1)) else {
                return Err("Usage: resource <name> <cost_per_hour>".into());
            };
            let rate: f64 = rate.parse().map_err(|_| "Invalid cost_per_hour".to_string())?;
            let id = project
                .add_resource(*name, ResourceKind::Work, rate)
                .map_err(err)?;
            Ok(format!("Added resource {id}."))
        }
        "assign" => {
            let resource = args
                .first()
                .and_then(|raw| project.find_resource(raw))
                .ok_or_else(|| "Unknown resource".to_string())?;
            let task = parse_task(args.get(1).copied())?;
            let units: u32 = args
                .get(2)
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| "Invalid units".to_string())?;
            let id = project.assign(task, resource, units).map_err(err)?;
            Ok(format!("Added assignment {id}."))
        }
        "constraint" => {
            let task = parse_task(args.first().copied())?;
            let kind = args
                .get(1)
                .ok_or_else(|| "Missing constraint type".to_string())?
                .parse::<ConstraintType>()
                .map_err(err)?;
            let constraint = if kind.has_anchor() {
                Constraint {
                    kind,
                    anchor: parse_time(args.get(2).copied())?,
                }
            } else {
                Constraint {
                    kind,
                    ..Constraint::default()
                }
            };
            project.set_constraint(task, constraint).map_err(err)?;
            Ok(format!("Constraint on {task} set to {constraint}."))
        }
        "remove" => {
            let task = parse_task(args.first().copied())?;
            let removed = project.remove_subtree(task).map_err(err)?;
            Ok(format!("Removed {} task(s).", removed.len()))
        }
        "start" => {
            let start = parse_time(args.first().copied())?;
            project.set_project_start(start).map_err(err)?;
            Ok(format!("Project start set to {start}."))
        }
        "holiday" => {
            let date = parse_time(args.first().copied())?.date();
            let calendar = project.project_calendar();
            project.add_holiday(calendar, date).map_err(err)?;
            Ok(format!("Holiday added on {date}."))
        }
        "compute" => {
            let summary = project.reschedule_now().map_err(err)?;
            let table = show(project).map_err(err)?;
            Ok(format!("Refreshed ({})\n{table}", summary.to_cli_summary()))
        }
        "critical" => {
            let path = project.critical_path();
            if path.is_empty() {
                return Ok("No critical tasks.".into());
            }
            let names: Vec<String> = path
                .iter()
                .filter_map(|id| project.get_task(*id))
                .map(|task| format!("{} {}", task.id(), task.name()))
                .collect();
            Ok(format!("Critical path: {}", names.join(" -> ")))
        }
        "cost" => {
            let task = parse_task(args.first().copied())?;
            let cost = project.task_cost(task).map_err(err)?;
            Ok(format!("Cost of {task}: {cost:.2}"))
        }
        "batch" => match args.first().copied() {
            Some("begin") => {
                project.begin_batch();
                Ok("Batch started.".into())
            }
            Some("end") => match project.end_batch().map_err(err)? {
                Some(summary) => Ok(format!("Batch ended ({}).", summary.to_cli_summary())),
                None => Ok("Batch ended.".into()),
            },
            _ => Err("Usage: batch begin|end".into()),
        },
        "export" => {
            let (Some(format), Some(path)) = (args.first(), args.get(1)) else {
                return Err("Usage: export <json|csv> <path>".into());
            };
            let report = ScheduleReport::from_project(project).map_err(err)?;
            match *format {
                "json" => report.write_json(path).map_err(err)?,
                "csv" => report.write_csv(path).map_err(err)?,
                other => return Err(format!("Unknown export format '{other}'")),
            }
            Ok(format!("Report written to {path}."))
        }
        _ => Err("Unknown command. Type 'help'.".into()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut project = Project::new();
    println!("CPM Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();
        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            _ => match run_command(&mut project, cmd, &args) {
                Ok(message) => println!("{message}"),
                Err(message) => println!("Error: {message}"),
            },
        }
    }
}
