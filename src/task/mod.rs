mod future_task;
mod runnable;

#[cfg(test)]
mod future_task_test;

pub use future_task::*;
pub use runnable::*;
