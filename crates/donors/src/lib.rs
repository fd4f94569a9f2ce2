//! Donor records and the eligibility rules that gate their donations.

pub mod donor;
pub mod registry;

pub use donor::{Donor, DonorContact, EligibilityRules, NewDonor, age_on};
pub use registry::DonorRegistry;
