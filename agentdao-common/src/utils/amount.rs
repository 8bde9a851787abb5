/// Number of lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Converts a SOL amount into lamports, rounding to the nearest lamport.
/// Negative and non-finite inputs clamp to zero.
pub fn sol_to_lamports(sol: f64) -> u64 {
    if !sol.is_finite() || sol <= 0.0 {
        return 0;
    }
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Serde adapter rendering a lamport amount as a SOL number.
///
/// Interop payloads (proposal and payment summaries, stats) carry SOL values.
pub mod as_sol {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(lamports: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(super::lamports_to_sol(*lamports))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sol = f64::deserialize(deserializer)?;
        Ok(super::sol_to_lamports(sol))
    }
}
