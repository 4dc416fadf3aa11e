//! Test Claim Generator
//!
//! Writes random claims as JSON lines, ready for `claim-fraud batch`.

use clap::Parser;
use claim_fraud_detector::types::{ClaimInput, FeatureOverrides, IncidentSeverity, PoliceReport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufWriter, Write};

#[derive(Parser)]
#[command(name = "claim-generator")]
#[command(about = "Generate random insurance claims as JSON lines")]
struct Cli {
    /// Number of claims to generate
    #[arg(short = 'n', long, default_value_t = 100)]
    count: usize,

    /// Share of claims shaped like suspicious ones (0.0 - 1.0)
    #[arg(long, default_value_t = 0.2)]
    fraud_ratio: f64,

    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

/// Claim generator for testing
struct ClaimGenerator {
    rng: StdRng,
}

impl ClaimGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Ordinary claim: modest amounts, usually reported and witnessed
    fn generate_ordinary(&mut self) -> FeatureOverrides {
        let premium = self.rng.gen_range(20_000..=120_000);
        let claim = ClaimInput {
            age: self.rng.gen_range(18..=80),
            policy_annual_premium: premium,
            total_claim_amount: self.rng.gen_range(1_000..=premium * 3),
            incident_severity: if self.rng.gen_bool(0.5) {
                IncidentSeverity::TrivialDamage
            } else {
                IncidentSeverity::MinorDamage
            },
            police_report_available: if self.rng.gen_bool(0.85) {
                PoliceReport::Yes
            } else {
                PoliceReport::No
            },
            witnesses: self.rng.gen_range(0..=3),
        };
        self.with_claim_split(claim)
    }

    /// Suspicious claim: large relative to premium, major damage, thin evidence
    fn generate_suspicious(&mut self) -> FeatureOverrides {
        let premium = self.rng.gen_range(5_000..=60_000);
        let claim = ClaimInput {
            age: self.rng.gen_range(18..=45),
            policy_annual_premium: premium,
            total_claim_amount: self.rng.gen_range(premium * 5..=2_000_000_i64.min(premium * 40)),
            incident_severity: IncidentSeverity::MajorDamage,
            police_report_available: if self.rng.gen_bool(0.8) {
                PoliceReport::No
            } else {
                PoliceReport::Yes
            },
            witnesses: if self.rng.gen_bool(0.75) { 0 } else { 1 },
        };
        self.with_claim_split(claim)
    }

    /// Add injury/property/vehicle amounts that sum to the claim total
    fn with_claim_split(&mut self, claim: ClaimInput) -> FeatureOverrides {
        let total = claim.total_claim_amount;
        let injury = self.rng.gen_range(0..=total / 2);
        let property = self.rng.gen_range(0..=(total - injury) / 2);
        let vehicle = total - injury - property;

        claim
            .to_overrides()
            .with("injury_claim", injury)
            .with("property_claim", property)
            .with("vehicle_claim", vehicle)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if !(0.0..=1.0).contains(&cli.fraud_ratio) {
        anyhow::bail!("--fraud-ratio must be within [0, 1]");
    }

    let mut generator = ClaimGenerator::new(cli.seed);
    let mut out = BufWriter::new(std::io::stdout().lock());

    for _ in 0..cli.count {
        let claim = if generator.rng.gen_bool(cli.fraud_ratio) {
            generator.generate_suspicious()
        } else {
            generator.generate_ordinary()
        };
        writeln!(out, "{}", serde_json::to_string(&claim)?)?;
    }

    out.flush()?;
    Ok(())
}
