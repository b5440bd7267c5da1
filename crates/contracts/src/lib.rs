//! Contract bindings for the limit-order hook and the pool manager it sits on.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod precompiles;
