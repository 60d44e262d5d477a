//! Scripted composite providers for pipeline tests.
//!
//! A `ScriptedProvider` answers each year from a fixed script instead of a
//! scene archive, so tests can pin exact reflectances or inject failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use audit_common::{AuditError, AuditYear, Result};
use vegetation::{Composite, CompositeProvider, Region};

use crate::generators::uniform_composite;

/// Grid used by scripted composites; small enough to keep tests fast.
const SCRIPTED_PIXEL_SIZE_M: f64 = 500.0;
const SCRIPTED_MAX_DIM: usize = 32;

/// What a scripted provider returns for one year.
#[derive(Debug, Clone)]
pub enum YearScript {
    /// Uniform reflectance over the region grid; `None` is no-data.
    Uniform { nir: Option<f32>, red: Option<f32> },
    /// Fail with this error.
    Fail(AuditError),
    /// Sleep before answering with a uniform composite.
    Slow { delay: Duration, nir: f32, red: f32 },
}

/// Composite provider driven by a per-year script.
///
/// Years missing from the script fail with `NoCloudFreeImagery`.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: HashMap<i32, YearScript>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform NIR and red for `year`.
    pub fn with_uniform(mut self, year: i32, nir: f32, red: f32) -> Self {
        self.script.insert(
            year,
            YearScript::Uniform {
                nir: Some(nir),
                red: Some(red),
            },
        );
        self
    }

    /// An all-no-data composite for `year`.
    pub fn with_nodata(mut self, year: i32) -> Self {
        self.script
            .insert(year, YearScript::Uniform { nir: None, red: None });
        self
    }

    pub fn with_error(mut self, year: i32, error: AuditError) -> Self {
        self.script.insert(year, YearScript::Fail(error));
        self
    }

    pub fn with_delay(mut self, year: i32, delay: Duration, nir: f32, red: f32) -> Self {
        self.script.insert(year, YearScript::Slow { delay, nir, red });
        self
    }

    /// Number of `get_composite` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompositeProvider for ScriptedProvider {
    async fn get_composite(
        &self,
        region: &Region,
        year: AuditYear,
        cloud_threshold_pct: f64,
    ) -> Result<Composite> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let extent = region.grid(SCRIPTED_PIXEL_SIZE_M, SCRIPTED_MAX_DIM);

        let (nir, red) = match self.script.get(&year.0) {
            Some(YearScript::Uniform { nir, red }) => (*nir, *red),
            Some(YearScript::Fail(error)) => return Err(error.clone()),
            Some(YearScript::Slow { delay, nir, red }) => {
                tokio::time::sleep(*delay).await;
                (Some(*nir), Some(*red))
            }
            None => {
                return Err(AuditError::NoCloudFreeImagery {
                    year: year.0,
                    threshold_pct: cloud_threshold_pct,
                })
            }
        };

        let mut composite = uniform_composite(year, extent, nir, red);
        composite.cloud_threshold_pct = cloud_threshold_pct;
        Ok(composite)
    }
}
