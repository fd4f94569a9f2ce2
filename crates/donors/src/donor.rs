use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use bloodbank_core::{BloodGroup, DomainError, DonorId, Entity};

/// Age window and cooldown that gate donations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRules {
    pub min_age: u32,
    pub max_age: u32,
    /// Calendar months that must pass between two donations by the same donor.
    pub cooldown_months: u32,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 65,
            cooldown_months: 3,
        }
    }
}

impl EligibilityRules {
    pub fn age_allowed(&self, age: u32) -> bool {
        (self.min_age..=self.max_age).contains(&age)
    }
}

/// Whole years between `date_of_birth` and `today`; `None` if born after `today`.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(date_of_birth)
}

/// Contact details a donor may change after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorContact {
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub address: String,
}

impl DonorContact {
    /// Trimmed copy with every field checked; a blank email becomes `None`.
    fn validated(self) -> Result<Self, DomainError> {
        let name = required_text("name", &self.name)?;
        let phone_number = self.phone_number.trim();
        if phone_number.len() != 10 || !phone_number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid_argument(
                "phone number must be exactly 10 digits",
            ));
        }
        let email = match self.email.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(email) => Some(valid_email(email)?),
        };
        let address = required_text("address", &self.address)?;

        Ok(Self {
            name,
            phone_number: phone_number.to_string(),
            email,
            address,
        })
    }
}

fn required_text(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_argument(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn valid_email(email: &str) -> Result<String, DomainError> {
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(DomainError::invalid_argument(format!(
            "invalid email address: {email:?}"
        )));
    }
    Ok(email.to_string())
}

/// Fields supplied when registering a donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonor {
    pub date_of_birth: NaiveDate,
    pub blood_group: BloodGroup,
    #[serde(flatten)]
    pub contact: DonorContact,
    pub last_donation_date: Option<NaiveDate>,
}

/// A registered donor.
///
/// `eligible` is maintained here, outside the inventory ledger; whoever records
/// a donation on a donor's behalf checks it first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    id: DonorId,
    date_of_birth: NaiveDate,
    blood_group: BloodGroup,
    #[serde(flatten)]
    contact: DonorContact,
    last_donation_date: Option<NaiveDate>,
    donation_count: u32,
    eligible: bool,
}

impl Donor {
    /// Register a donor; eligibility follows the age window on `today`.
    pub fn register(new: NewDonor, today: NaiveDate, rules: &EligibilityRules) -> Result<Self, DomainError> {
        let contact = new.contact.validated()?;
        if new.date_of_birth >= today {
            return Err(DomainError::invalid_argument(
                "date of birth must be in the past",
            ));
        }
        let eligible = age_on(new.date_of_birth, today).is_some_and(|age| rules.age_allowed(age));

        Ok(Self {
            id: DonorId::new(),
            date_of_birth: new.date_of_birth,
            blood_group: new.blood_group,
            contact,
            last_donation_date: new.last_donation_date,
            donation_count: 0,
            eligible,
        })
    }

    pub fn id_typed(&self) -> DonorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.contact.name
    }

    pub fn contact(&self) -> &DonorContact {
        &self.contact
    }

    pub fn email(&self) -> Option<&str> {
        self.contact.email.as_deref()
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    pub fn blood_group(&self) -> BloodGroup {
        self.blood_group
    }

    pub fn last_donation_date(&self) -> Option<NaiveDate> {
        self.last_donation_date
    }

    pub fn donation_count(&self) -> u32 {
        self.donation_count
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible
    }

    pub fn set_eligible(&mut self, eligible: bool) {
        self.eligible = eligible;
    }

    /// Replace name, phone, email and address. Blood group, birth date and
    /// donation history are not editable.
    pub fn update_contact(&mut self, contact: DonorContact) -> Result<(), DomainError> {
        self.contact = contact.validated()?;
        Ok(())
    }

    /// First day this donor may donate again.
    pub fn next_eligible_date(&self, rules: &EligibilityRules) -> Option<NaiveDate> {
        self.last_donation_date
            .and_then(|last| last.checked_add_months(Months::new(rules.cooldown_months)))
    }

    /// Gate checked before a donation is recorded for this donor.
    pub fn ensure_can_donate(&self, today: NaiveDate, rules: &EligibilityRules) -> Result<(), DomainError> {
        if !self.eligible {
            return Err(DomainError::invalid_argument(format!(
                "donor {} is not eligible to donate",
                self.id
            )));
        }
        if let Some(next) = self.next_eligible_date(rules) {
            if today < next {
                return Err(DomainError::invalid_argument(format!(
                    "donor {} is not eligible for donation until {next}",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Note a donation that the ledger has accepted.
    pub fn record_donation(&mut self, today: NaiveDate) {
        self.last_donation_date = Some(today);
        self.donation_count += 1;
    }
}

impl Entity for Donor {
    type Id = DonorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
