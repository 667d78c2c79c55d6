//! Repository traits

mod challenge_repo;
mod event_repo;
mod state_repo;
mod submission_repo;

pub use challenge_repo::ChallengeRepository;
pub use event_repo::IndexedEventRepository;
pub use state_repo::IndexerStateRepository;
pub use submission_repo::SubmissionRepository;

/// Everything the indexer writes
pub trait IndexerStore:
    ChallengeRepository + SubmissionRepository + IndexedEventRepository + IndexerStateRepository
{
}

impl<T> IndexerStore for T where
    T: ChallengeRepository + SubmissionRepository + IndexedEventRepository + IndexerStateRepository
{
}
