//! Stateless helpers shared by every rule.

pub mod allowance;
pub mod candidates;
pub mod classify;
pub mod overloads;

#[doc(inline)]
pub use allowance::{check_allow_with_reason, AllowCheck};
#[doc(inline)]
pub use candidates::{discover, CancellationCandidate, CandidateKind};
#[doc(inline)]
pub use classify::{
    has_cancellation_parameter, is_asynchronous_handle, is_cancellation_token, is_none_sentinel,
    return_shape, ReturnShape, WellKnownTypes,
};
#[doc(inline)]
pub use overloads::{
    bound_cancellation_arguments, bound_parameter, has_overload_with_cancellation_token,
    overload_with_cancellation_token, unbound_optional_cancellation_parameter, BoundToken,
};
