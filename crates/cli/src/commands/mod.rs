mod compare;
mod delta;
mod problem_id;

pub(crate) use compare::{cmd_compare, CompareArgs};
pub(crate) use delta::cmd_delta;
pub(crate) use problem_id::cmd_problem_id;
