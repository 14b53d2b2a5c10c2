//! Boundary to the external biSBM community detector

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, CommunityAssignment};
use crate::graph::{EdgeList, TypeVector};
use crate::storage;

/// Target community counts for one fitting run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Communities among vendors
    pub ka: usize,
    /// Communities among products
    pub kb: usize,
    pub deg_corr: bool,
}

impl DetectionParams {
    /// Directory-safe name of this trial
    pub fn label(&self) -> String {
        format!("ka{}_kb{}", self.ka, self.kb)
    }
}

impl fmt::Display for DetectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ka={} kb={} deg_corr={}", self.ka, self.kb, self.deg_corr)
    }
}

/// Parses `KA:KB`; degree correction defaults on and is set by the caller
impl FromStr for DetectionParams {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (ka, kb) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("expected KA:KB, got '{}'", s))?;
        Ok(Self {
            ka: ka.trim().parse()?,
            kb: kb.trim().parse()?,
            deg_corr: true,
        })
    }
}

/// An opaque, blocking community detection service
pub trait CommunityDetector: Sync {
    fn detect(
        &self,
        edges: &EdgeList,
        types: &TypeVector,
        params: &DetectionParams,
    ) -> Result<CommunityAssignment>;
}

/// Returns the same assignment for every call
#[derive(Debug, Clone)]
pub struct FixedAssignment {
    pub assignment: CommunityAssignment,
}

impl FixedAssignment {
    pub fn new(clusters: Vec<ClusterId>) -> Self {
        Self {
            assignment: CommunityAssignment::new(clusters),
        }
    }
}

impl CommunityDetector for FixedAssignment {
    fn detect(
        &self,
        _edges: &EdgeList,
        _types: &TypeVector,
        _params: &DetectionParams,
    ) -> Result<CommunityAssignment> {
        Ok(self.assignment.clone())
    }
}

/// Runs an external program per trial over files written to `work_dir`.
///
/// Arguments may contain `{edgelist}`, `{types}`, `{output}`, `{ka}`, `{kb}`
/// and `{deg_corr}`; the program must write one label per line to `{output}`.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            work_dir: work_dir.into(),
        }
    }

    fn render_args(&self, dir: &Path, params: &DetectionParams) -> Vec<String> {
        let path = |name: &str| dir.join(name).display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{edgelist}", &path("edgelist"))
                    .replace("{types}", &path("types"))
                    .replace("{output}", &path("assignment"))
                    .replace("{ka}", &params.ka.to_string())
                    .replace("{kb}", &params.kb.to_string())
                    .replace("{deg_corr}", &params.deg_corr.to_string())
            })
            .collect()
    }
}

impl CommunityDetector for ExternalCommand {
    fn detect(
        &self,
        edges: &EdgeList,
        types: &TypeVector,
        params: &DetectionParams,
    ) -> Result<CommunityAssignment> {
        let dir = self.work_dir.join(params.label());
        fs::create_dir_all(&dir)?;

        storage::write_edgelist(&dir.join("edgelist"), edges)?;
        storage::write_types(&dir.join("types"), types)?;

        let args = self.render_args(&dir, params);
        log::info!("Running detector ({}): {} {:?}", params, self.program, args);

        let status = Command::new(&self.program).args(&args).status()?;
        if !status.success() {
            return Err(anyhow!(
                "detector '{}' failed for {} with {}",
                self.program,
                params,
                status
            ));
        }

        storage::read_assignment(&dir.join("assignment"))
    }
}

/// Run independent trials in parallel; the first failure aborts the batch.
///
/// Trials sharing a label would share a work directory, so only the first
/// trial per `(ka, kb)` runs.
pub fn run_trials<D: CommunityDetector>(
    detector: &D,
    edges: &EdgeList,
    types: &TypeVector,
    trials: &[DetectionParams],
) -> Result<Vec<(DetectionParams, CommunityAssignment)>> {
    let unique: Vec<DetectionParams> = trials
        .iter()
        .copied()
        .unique_by(|params| (params.ka, params.kb))
        .collect();
    if unique.len() < trials.len() {
        log::warn!(
            "Dropped {} repeated trials",
            trials.len() - unique.len()
        );
    }

    log::info!("Dispatching {} detection trials", unique.len());

    unique
        .par_iter()
        .map(|params| -> Result<(DetectionParams, CommunityAssignment)> {
            let assignment = detector.detect(edges, types, params)?;
            Ok((*params, assignment))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trial() {
        let params: DetectionParams = "3:12".parse().unwrap();
        assert_eq!((params.ka, params.kb), (3, 12));
        assert_eq!(params.label(), "ka3_kb12");
        assert!("3".parse::<DetectionParams>().is_err());
        assert!("a:2".parse::<DetectionParams>().is_err());
    }

    #[test]
    fn placeholders_are_substituted() {
        let command = ExternalCommand::new(
            "bisbm",
            vec!["--ka={ka}".to_string(), "{output}".to_string(), "{deg_corr}".to_string()],
            "/tmp/work",
        );
        let params = DetectionParams {
            ka: 2,
            kb: 5,
            deg_corr: false,
        };
        let dir = Path::new("/tmp/work/ka2_kb5");
        assert_eq!(
            command.render_args(dir, &params),
            vec![
                "--ka=2".to_string(),
                dir.join("assignment").display().to_string(),
                "false".to_string(),
            ]
        );
    }

    #[test]
    fn trials_keep_their_order() {
        let detector = FixedAssignment::new(vec![0, 1]);
        let edges = EdgeList {
            edges: vec![(1, 2)],
        };
        let trials: Vec<DetectionParams> = (1..=4)
            .map(|k| DetectionParams {
                ka: k,
                kb: k,
                deg_corr: true,
            })
            .collect();

        let results = run_trials(&detector, &edges, &TypeVector::new(1, 1), &trials).unwrap();
        assert_eq!(
            results.iter().map(|(p, _)| p.ka).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(results.iter().all(|(_, a)| a.clusters == vec![0, 1]));
    }

    #[cfg(unix)]
    #[test]
    fn repeated_trials_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls");
        let command = ExternalCommand::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo run >> \"$1\"; printf '0\\n1\\n' > \"$0\"".to_string(),
                "{output}".to_string(),
                calls.display().to_string(),
            ],
            dir.path(),
        );
        let params = DetectionParams {
            ka: 3,
            kb: 3,
            deg_corr: true,
        };
        let edges = EdgeList {
            edges: vec![(1, 2)],
        };

        let results =
            run_trials(&command, &edges, &TypeVector::new(1, 1), &[params, params]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.clusters, vec![0, 1]);
        assert_eq!(fs::read_to_string(&calls).unwrap(), "run\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let command = ExternalCommand::new("false", Vec::new(), dir.path());
        let params = DetectionParams {
            ka: 1,
            kb: 1,
            deg_corr: true,
        };
        let edges = EdgeList {
            edges: vec![(1, 2)],
        };
        assert!(command
            .detect(&edges, &TypeVector::new(1, 1), &params)
            .is_err());
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let command = ExternalCommand::new(
            "sh",
            vec![
                "-c".to_string(),
                "printf '4\\n9\\n' > \"$0\"".to_string(),
                "{output}".to_string(),
            ],
            dir.path(),
        );
        let params = DetectionParams {
            ka: 1,
            kb: 1,
            deg_corr: true,
        };
        let edges = EdgeList {
            edges: vec![(1, 2)],
        };
        let assignment = command
            .detect(&edges, &TypeVector::new(1, 1), &params)
            .unwrap();
        assert_eq!(assignment.clusters, vec![4, 9]);
        assert!(dir.path().join("ka1_kb1").join("edgelist").exists());
    }
}
