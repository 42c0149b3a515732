//! Read-only schedule report built from the project accessors.

use crate::error::ScheduleResult;
use crate::ids::TaskId;
use crate::project::Project;
use crate::time::time_to_string;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: TaskId,
    pub name: String,
    pub wbs: String,
    pub parent: Option<TaskId>,
    pub task_type: String,
    pub start: String,
    pub finish: String,
    pub work_start: String,
    pub latest_start: String,
    pub latest_finish: String,
    /// Seconds.
    pub slack: i64,
    pub critical: bool,
    pub duration: i64,
    pub work: i64,
    pub percent_complete: u8,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub project_name: String,
    pub rows: Vec<ReportRow>,
}

impl ScheduleReport {
    /// One row per task in outline order. Takes `&mut` because costs are cached on read.
    pub fn from_project(project: &mut Project) -> ScheduleResult<Self> {
        let root = project.root();
        let mut rows = Vec::with_capacity(project.task_count());
        for id in project.pre_order(root)? {
            if id == root {
                continue;
            }
            let cost = project.task_cost(id)?;
            let wbs = project.wbs_id(id)?;
            let task = project.task(id)?;
            let schedule = task.schedule();
            rows.push(ReportRow {
                id,
                name: task.name().to_string(),
                wbs,
                parent: task.parent().filter(|parent| *parent != root),
                task_type: task.task_type().as_str().to_string(),
                start: time_to_string(schedule.start),
                finish: time_to_string(schedule.finish),
                work_start: time_to_string(schedule.work_start),
                latest_start: time_to_string(schedule.latest_start),
                latest_finish: time_to_string(schedule.latest_finish),
                slack: schedule.slack,
                critical: schedule.critical,
                duration: task.duration(),
                work: task.work(),
                percent_complete: task.percent_complete(),
                cost,
            });
        }
        Ok(Self {
            project_name: project.metadata().name.clone(),
            rows,
        })
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(13);

        let ids: Vec<u32> = self.rows.iter().map(|row| row.id.raw()).collect();
        columns.push(Series::new(PlSmallStr::from_static("id"), ids).into_column());

        columns.push(Self::string_column("wbs", |row| row.wbs.as_str(), &self.rows));
        columns.push(Self::string_column("name", |row| row.name.as_str(), &self.rows));

        let parents: Vec<Option<u32>> = self
            .rows
            .iter()
            .map(|row| row.parent.map(TaskId::raw))
            .collect();
        columns.push(Series::new(PlSmallStr::from_static("parent"), parents).into_column());

        columns.push(Self::string_column("type", |row| row.task_type.as_str(), &self.rows));
        columns.push(Self::string_column("start", |row| row.start.as_str(), &self.rows));
        columns.push(Self::string_column("finish", |row| row.finish.as_str(), &self.rows));
        columns.push(Self::string_column(
            "latest_start",
            |row| row.latest_start.as_str(),
            &self.rows,
        ));
        columns.push(Self::string_column(
            "latest_finish",
            |row| row.latest_finish.as_str(),
            &self.rows,
        ));

        let slack: Vec<i64> = self.rows.iter().map(|row| row.slack).collect();
        columns.push(Series::new(PlSmallStr::from_static("slack"), slack).into_column());

        let critical: Vec<bool> = self.rows.iter().map(|row| row.critical).collect();
        columns.push(Series::new(PlSmallStr::from_static("critical"), critical).into_column());

        let duration: Vec<i64> = self.rows.iter().map(|row| row.duration).collect();
        columns.push(Series::new(PlSmallStr::from_static("duration"), duration).into_column());

        let cost: Vec<f64> = self.rows.iter().map(|row| row.cost).collect();
        columns.push(Series::new(PlSmallStr::from_static("cost"), cost).into_column());

        DataFrame::new(columns)
    }

    fn string_column<F>(name: &'static str, field: F, rows: &[ReportRow]) -> Column
    where
        F: Fn(&ReportRow) -> &str,
    {
        let values: Vec<&str> = rows.iter().map(field).collect();
        Series::new(PlSmallStr::from_static(name), values).into_column()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> ScheduleResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> ScheduleResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
