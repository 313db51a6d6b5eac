//! Process-wide engine lifecycle and global parameters.
//!
//! The engine holds a structured reference string (SRS) shared by every
//! encoder and verifier.  It is installed by [`init`] or [`init_with`] and
//! dropped by [`cleanup`].  Both calls mutate process-wide state and must be
//! serialised by the embedding application; they are never invoked
//! implicitly.  Encoders and verifiers capture the parameters when they are
//! constructed, so a `cleanup` does not invalidate instances that already
//! exist.
//!
//! The SRS is derived from a fixed seed.  That makes every process agree on
//! the same parameters without a ceremony file, and it also means the
//! trapdoor is public: the resulting commitments bind honest encoders only.

use std::env;
use std::sync::{Arc, RwLock};

use ark_bn254::{Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{CurveGroup, Group};
use ark_ff::UniformRand;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{engine_failure, DaError, EngineResult, ResultCode};
use crate::rs::data_columns;

/// Largest column count the wire format can index (16-bit share indices).
pub const MAX_COLUMN_COUNT: usize = 1 << 16;

/// Column capacity used when no configuration is supplied.
pub const DEFAULT_MAX_COLUMN_COUNT: usize = 1024;

const DEFAULT_SRS_SEED: [u8; 32] = *b"blobshare:v1:insecure-srs-seed!!";

static ENGINE: RwLock<Option<Arc<GlobalParameters>>> = RwLock::new(None);

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest column count any encoder may request.  Determines the SRS
    /// size: one G1 power per data column.
    pub max_column_count: usize,
    /// Seed the SRS trapdoor is derived from.
    pub srs_seed: [u8; 32],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_column_count: DEFAULT_MAX_COLUMN_COUNT,
            srs_seed: DEFAULT_SRS_SEED,
        }
    }
}

impl EngineConfig {
    /// Builds a configuration from `BLOBSHARE_MAX_COLUMNS` and
    /// `BLOBSHARE_SRS_SEED` (64 hex characters), falling back to the
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = env::var("BLOBSHARE_MAX_COLUMNS") {
            match value.parse::<usize>() {
                Ok(parsed) => config.max_column_count = parsed,
                Err(err) => warn!(%value, %err, "ignoring BLOBSHARE_MAX_COLUMNS"),
            }
        }
        if let Ok(value) = env::var("BLOBSHARE_SRS_SEED") {
            match parse_seed(&value) {
                Some(seed) => config.srs_seed = seed,
                None => warn!(%value, "ignoring BLOBSHARE_SRS_SEED: expected 32 hex-encoded bytes"),
            }
        }
        config
    }

    /// Parses a JSON configuration document.  Missing fields take their
    /// default values.
    pub fn from_json_str(input: &str) -> Result<Self, DaError> {
        serde_json::from_str(input)
            .map_err(|err| DaError::invalid_input("config", format!("invalid engine config: {err}")))
    }

    fn validate(&self) -> Result<(), DaError> {
        if self.max_column_count == 0 || self.max_column_count > MAX_COLUMN_COUNT {
            return Err(DaError::invalid_input(
                "init",
                format!(
                    "max column count must be in 1..={MAX_COLUMN_COUNT}, got {}",
                    self.max_column_count
                ),
            ));
        }
        Ok(())
    }
}

fn parse_seed(value: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(value.trim().trim_start_matches("0x")).ok()?;
    bytes.try_into().ok()
}

/// Structured reference string shared by encoders and verifiers.
#[derive(Debug)]
pub(crate) struct GlobalParameters {
    config: EngineConfig,
    /// `[τ^i]G1` for `i` in `0..data_columns(max_column_count)`.
    pub(crate) g1_powers: Vec<G1Affine>,
    pub(crate) g2: G2Affine,
    /// `[τ]G2`.
    pub(crate) tau_g2: G2Affine,
}

impl GlobalParameters {
    pub(crate) fn generate(config: &EngineConfig) -> Self {
        let mut rng = StdRng::from_seed(config.srs_seed);
        let tau = Fr::rand(&mut rng);
        let degree = data_columns(config.max_column_count);

        let mut powers = Vec::with_capacity(degree);
        let mut current = G1Projective::generator();
        for _ in 0..degree {
            powers.push(current);
            current *= tau;
        }
        let g1_powers = G1Projective::normalize_batch(&powers);

        let g2 = G2Projective::generator();
        debug!(degree, "generated structured reference string");
        Self {
            config: config.clone(),
            g1_powers,
            g2: g2.into_affine(),
            tau_g2: (g2 * tau).into_affine(),
        }
    }

    pub(crate) fn max_column_count(&self) -> usize {
        self.config.max_column_count
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of coefficients a committed polynomial may have.
    pub(crate) fn capacity(&self) -> usize {
        self.g1_powers.len()
    }

    #[cfg(test)]
    pub(crate) fn tau_for_tests(config: &EngineConfig) -> Fr {
        let mut rng = StdRng::from_seed(config.srs_seed);
        Fr::rand(&mut rng)
    }
}

/// Initialises the engine from the environment (see [`EngineConfig::from_env`]).
pub fn init() -> Result<(), DaError> {
    init_with(EngineConfig::from_env())
}

/// Initialises the engine with an explicit configuration.
///
/// Calling it again with the same configuration is a no-op; a different
/// configuration replaces the parameters for instances created afterwards.
pub fn init_with(config: EngineConfig) -> Result<(), DaError> {
    config.validate()?;
    let mut engine = ENGINE
        .write()
        .map_err(|_| DaError::internal("init", "engine state lock poisoned"))?;
    if let Some(existing) = engine.as_ref() {
        if existing.config() == &config {
            debug!("engine already initialised");
            return Ok(());
        }
    }
    let params = GlobalParameters::generate(&config);
    *engine = Some(Arc::new(params));
    info!(
        max_column_count = config.max_column_count,
        "engine initialised"
    );
    Ok(())
}

/// Drops the global parameters.  Safe to call when not initialised.
pub fn cleanup() {
    let mut engine = match ENGINE.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if engine.take().is_some() {
        info!("engine cleaned up");
    }
}

/// Returns `true` between [`init`] and [`cleanup`].
pub fn is_initialized() -> bool {
    ENGINE.read().map(|engine| engine.is_some()).unwrap_or(false)
}

pub(crate) fn global_parameters() -> EngineResult<Arc<GlobalParameters>> {
    let engine = match ENGINE.read() {
        Ok(guard) => guard,
        Err(_) => return engine_failure(ResultCode::InternalError, "engine state lock poisoned"),
    };
    match engine.as_ref() {
        Some(params) => Ok(Arc::clone(params)),
        None => engine_failure(
            ResultCode::InternalError,
            "engine is not initialised; call blobshare::init first",
        ),
    }
}
