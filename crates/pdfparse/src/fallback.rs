//! Backend selection and the ordered fallback loop shared by both orchestrators.

use tracing::{debug, info, warn};

use crate::backend::{BackendId, BackendSelection, Direction};
use crate::error::{BackendError, BackendFailure};
use crate::probe::Availability;

/// Why no attempt could be planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlanError {
    /// A named backend belongs to the other direction.
    WrongDirection(BackendId),
    /// The explicitly named backend cannot run here.
    Unavailable { backend: BackendId, reason: String },
    /// Filtering left nothing to try.
    NoneAvailable,
}

/// Ordered backends to attempt for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Plan {
    pub order: Vec<BackendId>,
    /// A single backend was named; its failure is not followed by fallback.
    pub explicit: bool,
}

/// Resolve a selection against availability and the registered adapters.
pub(crate) fn plan(
    selection: &BackendSelection,
    direction: Direction,
    availability: &Availability,
    registered: impl Fn(BackendId) -> bool,
) -> Result<Plan, PlanError> {
    let candidates = selection.candidates(direction);
    if let Some(wrong) = candidates.iter().find(|id| id.direction() != direction) {
        return Err(PlanError::WrongDirection(*wrong));
    }

    let unusable = |id: BackendId| -> Option<String> {
        availability.unavailable_reason(id).or_else(|| {
            (!registered(id)).then(|| "no adapter registered".to_string())
        })
    };

    if let BackendSelection::Single(id) = selection {
        return match unusable(*id) {
            Some(reason) => Err(PlanError::Unavailable {
                backend: *id,
                reason,
            }),
            None => Ok(Plan {
                order: vec![*id],
                explicit: true,
            }),
        };
    }

    let mut order: Vec<BackendId> = Vec::with_capacity(candidates.len());
    for id in candidates {
        if order.contains(&id) {
            continue;
        }
        match unusable(id) {
            Some(reason) => debug!("skipping {} backend: {}", id, reason),
            None => order.push(id),
        }
    }

    if order.is_empty() {
        return Err(PlanError::NoneAvailable);
    }
    Ok(Plan {
        order,
        explicit: false,
    })
}

/// Successful outcome of a chain: the backend that produced `value`, plus the
/// failures that preceded it.
pub(crate) struct Success<T> {
    pub backend: BackendId,
    pub value: T,
    pub failures: Vec<BackendFailure>,
}

/// Try each backend in order until one succeeds.
///
/// Every failure is recorded and the next backend is tried. Returns the
/// ordered failures when the plan is exhausted.
pub(crate) fn run_with_fallback<T, F>(
    plan: &Plan,
    mut attempt: F,
) -> Result<Success<T>, Vec<BackendFailure>>
where
    F: FnMut(BackendId) -> Result<T, BackendError>,
{
    let mut failures = Vec::new();

    for &backend in &plan.order {
        debug!("trying {} backend", backend);
        match attempt(backend) {
            Ok(value) => {
                info!("{} backend succeeded", backend);
                return Ok(Success {
                    backend,
                    value,
                    failures,
                });
            }
            Err(e) => {
                warn!("{} backend failed: {}", backend, e);
                failures.push(BackendFailure::new(backend, e));
            }
        }
    }

    Err(failures)
}
