pub mod lock_policy;
