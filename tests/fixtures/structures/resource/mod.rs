// generated by schemac, do not edit
#![allow(unused_imports)]

use schemac::convert::runtime::{self, ExpandError};
use schemac::value::{Block, Value};
use crate::model as model;

mod kops_http_proxy;
mod kops_cluster;

pub use kops_http_proxy::*;
pub use kops_cluster::*;
