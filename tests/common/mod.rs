#![allow(dead_code)]

use deploydag::fs::mock::MockFileSystem;

pub const ROOT: &str = "/repo";
pub const ARTIFACTS: &str = "/repo/wsartifacts";

/// A small workspace:
///
/// - lakehouse `Sales` (json definition)
/// - views `daily` and `weekly` in container `Sales`, `weekly` reads `daily`
/// - semantic model `Finance Model` (git folder) on the lakehouse
/// - report `Overview` (metadata folder) on the model, report `Standalone`
/// - notebook `Load` as both `.ipynb` and git folder
/// - environment `Spark` with an explicit id
pub fn sample_workspace() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(format!("{ARTIFACTS}/Lakehouses/Sales.json"), r#"{"name": "Sales"}"#);
    fs.add_file(format!("{ARTIFACTS}/Views/Sales/daily.sql"), "select 1");
    fs.add_file(format!("{ARTIFACTS}/Views/Sales/weekly.sql"), "select * from dbo.daily");
    fs.add_file(
        format!("{ARTIFACTS}/Views/Sales/metadata.json"),
        r#"{"dependencies": {"weekly": {"tables": ["orders"], "views": ["dbo.daily"]}}}"#,
    );
    fs.add_file(
        format!("{ARTIFACTS}/Semanticmodels/Finance.SemanticModel/.platform"),
        r#"{"metadata": {"type": "SemanticModel", "displayName": "Finance Model", "dependencies": ["lakehouse-Sales"]}}"#,
    );
    fs.add_file(
        format!("{ARTIFACTS}/Semanticmodels/Finance.SemanticModel/model.bim"),
        "{}",
    );
    fs.add_file(
        format!("{ARTIFACTS}/Reports/Overview/.platform"),
        r#"{"metadata": {"displayName": "Overview", "dependencies": ["semanticmodel-Finance Model"]}}"#,
    );
    fs.add_file(format!("{ARTIFACTS}/Reports/Standalone/.platform"), r#"{"metadata": {}}"#);
    fs.add_file(
        format!("{ARTIFACTS}/Notebooks/Load.ipynb"),
        r#"{"cells": [], "metadata": {"dependencies": ["lakehouse-Sales"]}}"#,
    );
    fs.add_file(
        format!("{ARTIFACTS}/Notebooks/Load.Notebook/.platform"),
        r#"{"metadata": {"displayName": "Load"}}"#,
    );
    fs.add_file(
        format!("{ARTIFACTS}/Environments/Spark.json"),
        r#"{"name": "Spark", "id": "env-spark"}"#,
    );
    fs
}
