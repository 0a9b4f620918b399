#![allow(unused_imports)]

pub(crate) use crate::error::Error;
pub(crate) use crate::si;
pub(crate) use crate::traits::*;
pub(crate) use crate::uc;
pub(crate) use crate::utils::almost_eq;

pub(crate) use anyhow::{anyhow, bail, ensure, Context};
pub(crate) use chrono::{DateTime, Utc};
pub(crate) use derive_more::From;
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use std::collections::{HashMap, VecDeque};
pub(crate) use std::fmt;
pub(crate) use std::fs::File;
pub(crate) use std::path::{Path, PathBuf};
pub(crate) use std::time::Duration;
pub(crate) use tracing::{debug, error, info, warn};
pub(crate) use uom::ConstZero;
