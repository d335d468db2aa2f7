// src/artifact/kind.rs

use std::fmt;
use std::str::FromStr;

/// Closed set of artifact kinds known to the deployer.
///
/// Variants are declared in priority-class order, so the derived `Ord` agrees
/// with [`ArtifactKind::priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    VariableLibrary,
    Environment,
    Lakehouse,
    KqlDatabase,
    Shortcut,
    SqlView,
    SemanticModel,
    Notebook,
    SparkJobDefinition,
    KqlQueryset,
    Report,
    PaginatedReport,
    Eventstream,
    DataPipeline,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 14] = [
        ArtifactKind::VariableLibrary,
        ArtifactKind::Environment,
        ArtifactKind::Lakehouse,
        ArtifactKind::KqlDatabase,
        ArtifactKind::Shortcut,
        ArtifactKind::SqlView,
        ArtifactKind::SemanticModel,
        ArtifactKind::Notebook,
        ArtifactKind::SparkJobDefinition,
        ArtifactKind::KqlQueryset,
        ArtifactKind::Report,
        ArtifactKind::PaginatedReport,
        ArtifactKind::Eventstream,
        ArtifactKind::DataPipeline,
    ];

    /// Priority class: lower values deploy first among dependency-ready
    /// artifacts. Only a tie-break, never a substitute for explicit edges.
    pub fn priority(self) -> u8 {
        match self {
            ArtifactKind::VariableLibrary => 1,
            ArtifactKind::Environment => 2,
            ArtifactKind::Lakehouse => 3,
            ArtifactKind::KqlDatabase => 4,
            ArtifactKind::Shortcut => 5,
            ArtifactKind::SqlView => 6,
            ArtifactKind::SemanticModel => 7,
            ArtifactKind::Notebook => 8,
            ArtifactKind::SparkJobDefinition => 9,
            ArtifactKind::KqlQueryset => 10,
            ArtifactKind::Report => 11,
            ArtifactKind::PaginatedReport => 12,
            ArtifactKind::Eventstream => 13,
            ArtifactKind::DataPipeline => 14,
        }
    }

    /// Name used by the target platform and in git-format folder suffixes
    /// (`MyLakehouse.Lakehouse/`).
    pub fn platform_name(self) -> &'static str {
        match self {
            ArtifactKind::VariableLibrary => "VariableLibrary",
            ArtifactKind::Environment => "Environment",
            ArtifactKind::Lakehouse => "Lakehouse",
            ArtifactKind::KqlDatabase => "KQLDatabase",
            ArtifactKind::Shortcut => "Shortcut",
            ArtifactKind::SqlView => "SqlView",
            ArtifactKind::SemanticModel => "SemanticModel",
            ArtifactKind::Notebook => "Notebook",
            ArtifactKind::SparkJobDefinition => "SparkJobDefinition",
            ArtifactKind::KqlQueryset => "KQLQueryset",
            ArtifactKind::Report => "Report",
            ArtifactKind::PaginatedReport => "PaginatedReport",
            ArtifactKind::Eventstream => "Eventstream",
            ArtifactKind::DataPipeline => "DataPipeline",
        }
    }

    /// Folder under the artifacts root holding definitions of this kind.
    ///
    /// Kinds without a folder are never discovered from disk.
    pub fn folder(self) -> Option<&'static str> {
        match self {
            ArtifactKind::VariableLibrary => Some("Variablelibraries"),
            ArtifactKind::Environment => Some("Environments"),
            ArtifactKind::Lakehouse => Some("Lakehouses"),
            ArtifactKind::SqlView => Some("Views"),
            ArtifactKind::SemanticModel => Some("Semanticmodels"),
            ArtifactKind::Notebook => Some("Notebooks"),
            ArtifactKind::SparkJobDefinition => Some("Sparkjobdefinitions"),
            ArtifactKind::Report => Some("Reports"),
            ArtifactKind::PaginatedReport => Some("Paginatedreports"),
            ArtifactKind::DataPipeline => Some("Datapipelines"),
            ArtifactKind::KqlDatabase
            | ArtifactKind::Shortcut
            | ArtifactKind::KqlQueryset
            | ArtifactKind::Eventstream => None,
        }
    }

    /// Reverse of [`ArtifactKind::folder`].
    pub fn from_folder(folder: &str) -> Option<ArtifactKind> {
        Self::ALL.into_iter().find(|k| k.folder() == Some(folder))
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            ArtifactKind::VariableLibrary => "varlib",
            ArtifactKind::Environment => "environment",
            ArtifactKind::Lakehouse => "lakehouse",
            ArtifactKind::KqlDatabase => "kqldatabase",
            ArtifactKind::Shortcut => "shortcut",
            ArtifactKind::SqlView => "view",
            ArtifactKind::SemanticModel => "semanticmodel",
            ArtifactKind::Notebook => "notebook",
            ArtifactKind::SparkJobDefinition => "sparkjob",
            ArtifactKind::KqlQueryset => "kqlqueryset",
            ArtifactKind::Report => "report",
            ArtifactKind::PaginatedReport => "paginatedreport",
            ArtifactKind::Eventstream => "eventstream",
            ArtifactKind::DataPipeline => "pipeline",
        }
    }

    /// Deterministic id for an artifact of this kind, stable across runs.
    pub fn default_id(self, name: &str) -> String {
        format!("{}-{}", self.id_prefix(), name)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.platform_name())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.platform_name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown artifact kind: {needle}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_follow_declaration_order() {
        let priorities: Vec<u8> = ArtifactKind::ALL.iter().map(|k| k.priority()).collect();
        assert_eq!(priorities, (1..=14).collect::<Vec<u8>>());
        assert!(ArtifactKind::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn folders_round_trip() {
        for kind in ArtifactKind::ALL {
            if let Some(folder) = kind.folder() {
                assert_eq!(ArtifactKind::from_folder(folder), Some(kind));
            }
        }
        assert_eq!(ArtifactKind::from_folder("Shortcuts"), None);
    }

    #[test]
    fn parses_platform_names_case_insensitively() {
        assert_eq!("kqldatabase".parse::<ArtifactKind>(), Ok(ArtifactKind::KqlDatabase));
        assert_eq!(" SqlView ".parse::<ArtifactKind>(), Ok(ArtifactKind::SqlView));
        assert!("Dashboard".parse::<ArtifactKind>().is_err());
    }
}
