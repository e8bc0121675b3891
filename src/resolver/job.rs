// src/resolver/job.rs

//! Execution jobs, their ordering requirements, and the job containers
//!
//! A job requirement is an edge between jobs: "run me only if job N
//! succeeded" (or failed, or was skipped). Requirement lists are
//! minimised before use: duplicate `(job, condition-set)` pairs are
//! dropped, first occurrence kept.
//!
//! `JobList` and `WorkList` share one container shape: append-only,
//! auto-numbered, random access by number, forward iteration. The
//! pretend plan and the execute plan are two instantiations of the
//! same `JobList`.

use super::resolvent::{DestinationType, Resolvent};
use crate::package::PackageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Position of a job in a job list
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct JobNumber(pub usize);

impl fmt::Display for JobNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of an item in a work list
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WorkListIndex(pub usize);

/// One condition under which a requirement applies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum RequiredIf {
    /// The required job completed successfully
    OnSuccess,
    /// The required job failed
    OnFailure,
    /// The required job was skipped
    OnSkip,
    /// Ordering only, regardless of the required job's outcome
    Independent,
}

/// A small ordered set of `RequiredIf` conditions
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RequiredIfSet(BTreeSet<RequiredIf>);

impl RequiredIfSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn with(mut self, r: RequiredIf) -> Self {
        self.0.insert(r);
        self
    }

    pub fn contains(&self, r: RequiredIf) -> bool {
        self.0.contains(&r)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequiredIf> {
        self.0.iter()
    }
}

impl FromIterator<RequiredIf> for RequiredIfSet {
    fn from_iter<I: IntoIterator<Item = RequiredIf>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An ordering/dependency edge between two jobs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobRequirement {
    pub job_number: JobNumber,
    pub required_if: RequiredIfSet,
}

impl JobRequirement {
    pub fn new(job_number: JobNumber, required_if: RequiredIfSet) -> Self {
        Self {
            job_number,
            required_if,
        }
    }
}

/// Drop duplicate requirements, keeping first occurrences in order
pub fn minimise_requirements(requirements: &[JobRequirement]) -> Vec<JobRequirement> {
    let mut seen: BTreeSet<JobRequirement> = BTreeSet::new();
    let mut result: Vec<JobRequirement> = requirements.to_vec();
    result.retain(|req| seen.insert(req.clone()));
    result
}

/// Append-only, auto-numbered job container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobList<T> {
    jobs: Vec<T>,
}

impl<T> JobList<T> {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Append a job, returning its number
    pub fn append(&mut self, job: T) -> JobNumber {
        self.jobs.push(job);
        JobNumber(self.jobs.len() - 1)
    }

    /// Random access by job number
    pub fn fetch(&self, number: JobNumber) -> Option<&T> {
        self.jobs.get(number.0)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.jobs.iter()
    }
}

impl<T> Default for JobList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only, auto-numbered work container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkList<T> {
    items: Vec<T>,
}

impl<T> WorkList<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an item, returning its index
    pub fn append(&mut self, item: T) -> WorkListIndex {
        self.items.push(item);
        WorkListIndex(self.items.len() - 1)
    }

    /// Random access by index
    pub fn fetch(&self, index: WorkListIndex) -> Option<&T> {
        self.items.get(index.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T> Default for WorkList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of the dry-run plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PretendJob {
    /// Would merge this id
    Change {
        resolvent: Resolvent,
        origin_id: PackageId,
        destination: DestinationType,
    },
    /// Would unmerge these ids
    Remove {
        resolvent: Resolvent,
        ids: Vec<PackageId>,
    },
}

/// One entry of the execute plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecuteJob {
    /// Download/prepare everything the merge needs
    Fetch {
        resolvent: Resolvent,
        origin_id: PackageId,
        requirements: Vec<JobRequirement>,
    },
    /// Build and merge
    Install {
        resolvent: Resolvent,
        origin_id: PackageId,
        destination: DestinationType,
        requirements: Vec<JobRequirement>,
    },
    /// Unmerge
    Uninstall {
        resolvent: Resolvent,
        ids: Vec<PackageId>,
        requirements: Vec<JobRequirement>,
    },
}

impl ExecuteJob {
    pub fn requirements(&self) -> &[JobRequirement] {
        match self {
            ExecuteJob::Fetch { requirements, .. }
            | ExecuteJob::Install { requirements, .. }
            | ExecuteJob::Uninstall { requirements, .. } => requirements,
        }
    }
}

/// The pretend plan and the execute plan together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLists {
    pub pretend_job_list: JobList<PretendJob>,
    pub execute_job_list: JobList<ExecuteJob>,
}

impl JobLists {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(job: usize, conditions: &[RequiredIf]) -> JobRequirement {
        JobRequirement::new(
            JobNumber(job),
            conditions.iter().copied().collect(),
        )
    }

    #[test]
    fn test_minimise_drops_duplicates_keeps_order() {
        let input = vec![
            req(3, &[RequiredIf::OnSuccess]),
            req(3, &[RequiredIf::OnSuccess]),
            req(1, &[RequiredIf::OnFailure]),
        ];
        let minimised = minimise_requirements(&input);
        assert_eq!(
            minimised,
            vec![
                req(3, &[RequiredIf::OnSuccess]),
                req(1, &[RequiredIf::OnFailure]),
            ]
        );
    }

    #[test]
    fn test_minimise_idempotent() {
        let input = vec![
            req(0, &[RequiredIf::OnSuccess]),
            req(2, &[RequiredIf::OnSuccess, RequiredIf::OnSkip]),
            req(0, &[RequiredIf::OnSuccess]),
            req(2, &[RequiredIf::OnSuccess]),
        ];
        let once = minimise_requirements(&input);
        let twice = minimise_requirements(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_minimise_distinguishes_condition_sets() {
        // Same job number, different condition sets: both survive
        let input = vec![
            req(5, &[RequiredIf::OnSuccess]),
            req(5, &[RequiredIf::OnFailure]),
        ];
        assert_eq!(minimise_requirements(&input).len(), 2);
    }

    #[test]
    fn test_job_list_numbering_and_fetch() {
        let mut list: JobList<&str> = JobList::new();
        let a = list.append("first");
        let b = list.append("second");
        assert_eq!(a, JobNumber(0));
        assert_eq!(b, JobNumber(1));
        assert_eq!(list.fetch(a), Some(&"first"));
        assert_eq!(list.fetch(JobNumber(7)), None);

        let collected: Vec<_> = list.iter().copied().collect();
        assert_eq!(collected, vec!["first", "second"]);
    }

    #[test]
    fn test_work_list_numbering_and_fetch() {
        let mut list: WorkList<u32> = WorkList::new();
        let a = list.append(10);
        let b = list.append(20);
        assert_eq!(a, WorkListIndex(0));
        assert_eq!(b, WorkListIndex(1));
        assert_eq!(list.fetch(b), Some(&20));
    }
}
