// src/resolver/resolved.rs

//! The final output of a resolution run
//!
//! `Resolved` carries the ordered job plans plus every decision,
//! partitioned the way callers consume them: taken changes ready to
//! run, taken changes still awaiting confirmation, untaken (optional)
//! changes, and the undecidable resolvents, taken and untaken. The
//! whole aggregate round-trips through JSON so an interrupted run can
//! be picked up by a later process.

use super::decision::Decision;
use super::job::{
    ExecuteJob, JobLists, JobNumber, JobRequirement, PretendJob, RequiredIf, RequiredIfSet,
    minimise_requirements,
};
use super::order::sort_for_execution;
use super::resolution::Resolution;
use super::resolvent::Resolvent;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Everything a resolution run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolved {
    pub job_lists: JobLists,
    /// Every resolution, in discovery order
    pub resolutions_by_resolvent: Vec<Resolution>,
    pub taken_change_or_remove_decisions: Vec<(Resolvent, Decision)>,
    pub taken_unconfirmed_change_or_remove_decisions: Vec<(Resolvent, Decision)>,
    pub untaken_change_or_remove_decisions: Vec<(Resolvent, Decision)>,
    pub taken_unable_to_make_decisions: Vec<(Resolvent, Decision)>,
    pub untaken_unable_to_make_decisions: Vec<(Resolvent, Decision)>,
}

impl Resolved {
    /// Assemble the aggregate from a finished pass's resolution map
    pub fn assemble(order: &[Resolvent], resolutions: &HashMap<Resolvent, Resolution>) -> Self {
        let mut resolved = Resolved::default();

        for resolvent in order {
            let Some(resolution) = resolutions.get(resolvent) else {
                continue;
            };
            resolved.resolutions_by_resolvent.push(resolution.clone());

            let Some(decision) = &resolution.decision else {
                continue;
            };
            let entry = (resolvent.clone(), decision.clone());

            match decision {
                Decision::ChangesToMake { .. } | Decision::Remove { .. } => {
                    if !decision.is_taken() {
                        resolved.untaken_change_or_remove_decisions.push(entry);
                    } else if decision.confirmations().is_empty() {
                        resolved.taken_change_or_remove_decisions.push(entry);
                    } else {
                        resolved
                            .taken_unconfirmed_change_or_remove_decisions
                            .push(entry);
                    }
                }
                Decision::UnableToMake { .. } => {
                    if decision.is_taken() {
                        resolved.taken_unable_to_make_decisions.push(entry);
                    } else {
                        resolved.untaken_unable_to_make_decisions.push(entry);
                    }
                }
                Decision::ExistingNoChange { .. } => {}
            }
        }

        resolved.job_lists = build_job_lists(order, resolutions);
        resolved
    }

    /// Persist to a file as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously persisted plan
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Build the pretend and execute plans from confirmed decisions
///
/// Only taken, fully-confirmed change-or-remove decisions become jobs.
/// An install requires its fetch to have succeeded; a dependent's
/// install requires each dependency's install to have succeeded.
fn build_job_lists(
    order: &[Resolvent],
    resolutions: &HashMap<Resolvent, Resolution>,
) -> JobLists {
    let execution_order = sort_for_execution(order, resolutions);
    let mut job_lists = JobLists::new();
    let mut install_job_for: HashMap<&Resolvent, JobNumber> = HashMap::new();

    for resolvent in &execution_order {
        let Some(resolution) = resolutions.get(resolvent) else {
            continue;
        };
        let Some(decision) = &resolution.decision else {
            continue;
        };
        if !decision.confirmations().is_empty() {
            continue;
        }

        match decision {
            Decision::ChangesToMake {
                origin_id,
                destination,
                ..
            } => {
                job_lists.pretend_job_list.append(PretendJob::Change {
                    resolvent: resolvent.clone(),
                    origin_id: origin_id.clone(),
                    destination: *destination,
                });

                let fetch_number = job_lists.execute_job_list.append(ExecuteJob::Fetch {
                    resolvent: resolvent.clone(),
                    origin_id: origin_id.clone(),
                    requirements: Vec::new(),
                });

                let mut requirements = vec![JobRequirement::new(
                    fetch_number,
                    RequiredIfSet::new().with(RequiredIf::OnSuccess),
                )];
                for dep in &origin_id.dependencies {
                    for other in &execution_order {
                        if !dep.spec.matches_name(&other.package) {
                            continue;
                        }
                        if let Some(number) = install_job_for.get(other) {
                            requirements.push(JobRequirement::new(
                                *number,
                                RequiredIfSet::new().with(RequiredIf::OnSuccess),
                            ));
                        }
                    }
                }
                let requirements = minimise_requirements(&requirements);

                let install_number = job_lists.execute_job_list.append(ExecuteJob::Install {
                    resolvent: resolvent.clone(),
                    origin_id: origin_id.clone(),
                    destination: *destination,
                    requirements,
                });
                install_job_for.insert(resolvent, install_number);
            }
            Decision::Remove { ids, .. } => {
                job_lists.pretend_job_list.append(PretendJob::Remove {
                    resolvent: resolvent.clone(),
                    ids: ids.clone(),
                });
                job_lists.execute_job_list.append(ExecuteJob::Uninstall {
                    resolvent: resolvent.clone(),
                    ids: ids.clone(),
                    requirements: Vec::new(),
                });
            }
            _ => {}
        }
    }

    job_lists
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::QualifiedName;
    use crate::package::{Dependency, OriginKind, PackageId};
    use crate::resolver::decision::Confirmation;
    use crate::resolver::resolvent::{DestinationType, SlotNameOrNull};
    use crate::spec::PackageSpec;
    use crate::version::PackageVersion;

    fn resolvent(name: &str) -> Resolvent {
        Resolvent::new(
            QualifiedName::parse(name).unwrap(),
            SlotNameOrNull::slot("0"),
            DestinationType::Install,
        )
    }

    fn origin(name: &str, deps: &[&str]) -> PackageId {
        let mut id = PackageId::new(
            QualifiedName::parse(name).unwrap(),
            PackageVersion::parse("1.0").unwrap(),
            "0",
            "main",
            OriginKind::Source,
        );
        for dep in deps {
            id = id.with_dependency(Dependency::new(
                PackageSpec::parse(dep).unwrap(),
                crate::package::DepKind::Run,
            ));
        }
        id
    }

    fn change(origin_id: PackageId, taken: bool, confirmations: Vec<Confirmation>) -> Decision {
        Decision::ChangesToMake {
            origin_id,
            destination: DestinationType::Install,
            confirmations,
            taken,
        }
    }

    fn setup(
        entries: Vec<(Resolvent, Decision)>,
    ) -> (Vec<Resolvent>, HashMap<Resolvent, Resolution>) {
        let mut order = Vec::new();
        let mut resolutions = HashMap::new();
        for (resolvent, decision) in entries {
            let mut resolution = Resolution::new(resolvent.clone());
            resolution.decision = Some(decision);
            order.push(resolvent.clone());
            resolutions.insert(resolvent, resolution);
        }
        (order, resolutions)
    }

    #[test]
    fn test_partitioning() {
        let (order, resolutions) = setup(vec![
            (resolvent("app/taken"), change(origin("app/taken", &[]), true, vec![])),
            (
                resolvent("app/unconfirmed"),
                change(
                    origin("app/unconfirmed", &[]),
                    true,
                    vec![Confirmation::Downgrade],
                ),
            ),
            (
                resolvent("app/untaken"),
                change(origin("app/untaken", &[]), false, vec![]),
            ),
            (
                resolvent("app/unable"),
                Decision::UnableToMake {
                    unsuitable: Vec::new(),
                    taken: true,
                },
            ),
        ]);

        let resolved = Resolved::assemble(&order, &resolutions);
        assert_eq!(resolved.taken_change_or_remove_decisions.len(), 1);
        assert_eq!(resolved.taken_unconfirmed_change_or_remove_decisions.len(), 1);
        assert_eq!(resolved.untaken_change_or_remove_decisions.len(), 1);
        assert_eq!(resolved.taken_unable_to_make_decisions.len(), 1);
        assert!(resolved.untaken_unable_to_make_decisions.is_empty());
        assert_eq!(resolved.resolutions_by_resolvent.len(), 4);
    }

    #[test]
    fn test_job_lists_fetch_before_install() {
        let (order, resolutions) = setup(vec![(
            resolvent("app/foo"),
            change(origin("app/foo", &[]), true, vec![]),
        )]);

        let resolved = Resolved::assemble(&order, &resolutions);
        let execute = &resolved.job_lists.execute_job_list;
        assert_eq!(execute.len(), 2);

        match execute.fetch(JobNumber(1)).unwrap() {
            ExecuteJob::Install { requirements, .. } => {
                assert_eq!(requirements.len(), 1);
                assert_eq!(requirements[0].job_number, JobNumber(0));
                assert!(requirements[0].required_if.contains(RequiredIf::OnSuccess));
            }
            other => panic!("expected install job, got {:?}", other),
        }
    }

    #[test]
    fn test_dependency_install_edge() {
        let (order, resolutions) = setup(vec![
            (
                resolvent("app/foo"),
                change(origin("app/foo", &["sys-libs/zlib"]), true, vec![]),
            ),
            (
                resolvent("sys-libs/zlib"),
                change(origin("sys-libs/zlib", &[]), true, vec![]),
            ),
        ]);

        let resolved = Resolved::assemble(&order, &resolutions);
        let execute = &resolved.job_lists.execute_job_list;
        // zlib fetch+install first, then foo fetch+install
        assert_eq!(execute.len(), 4);

        match execute.fetch(JobNumber(3)).unwrap() {
            ExecuteJob::Install {
                resolvent: r,
                requirements,
                ..
            } => {
                assert_eq!(r.package, QualifiedName::new("app", "foo"));
                // Requires its own fetch and zlib's install
                assert_eq!(requirements.len(), 2);
                assert!(requirements.iter().any(|req| req.job_number == JobNumber(1)));
            }
            other => panic!("expected install job, got {:?}", other),
        }
    }

    #[test]
    fn test_unconfirmed_decisions_get_no_jobs() {
        let (order, resolutions) = setup(vec![(
            resolvent("app/foo"),
            change(
                origin("app/foo", &[]),
                true,
                vec![Confirmation::MaskOverride],
            ),
        )]);

        let resolved = Resolved::assemble(&order, &resolutions);
        assert!(resolved.job_lists.execute_job_list.is_empty());
        assert!(resolved.job_lists.pretend_job_list.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (order, resolutions) = setup(vec![
            (resolvent("app/foo"), change(origin("app/foo", &[]), true, vec![])),
            (
                resolvent("app/unable"),
                Decision::UnableToMake {
                    unsuitable: Vec::new(),
                    taken: false,
                },
            ),
        ]);
        let resolved = Resolved::assemble(&order, &resolutions);

        let file = tempfile::NamedTempFile::new().unwrap();
        resolved.save(file.path()).unwrap();
        let loaded = Resolved::load(file.path()).unwrap();
        assert_eq!(resolved, loaded);
    }
}
