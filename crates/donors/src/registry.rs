//! In-memory store of registered donors.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use bloodbank_core::{BloodGroup, DomainError, DomainResult, DonorId, Entity};

use crate::donor::{Donor, DonorContact, EligibilityRules, NewDonor};

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<DonorId, Donor>,
    order: Vec<DonorId>,
}

impl Inner {
    fn ordered(&self) -> impl Iterator<Item = &Donor> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Emails are unique across donors, compared case-insensitively.
    fn ensure_email_free(&self, email: Option<&str>, owner: Option<DonorId>) -> DomainResult<()> {
        let Some(email) = email else {
            return Ok(());
        };
        let taken = self.by_id.values().any(|d| {
            Some(d.id_typed()) != owner && d.email().is_some_and(|e| e.eq_ignore_ascii_case(email))
        });
        if taken {
            return Err(DomainError::invalid_argument(format!(
                "email already registered: {email}"
            )));
        }
        Ok(())
    }

    fn get_mut(&mut self, donor_id: DonorId) -> DomainResult<&mut Donor> {
        self.by_id
            .get_mut(&donor_id)
            .ok_or_else(|| DomainError::not_found(format!("donor {donor_id}")))
    }
}

/// Owns every registered donor, in registration order.
#[derive(Debug, Default)]
pub struct DonorRegistry {
    inner: RwLock<Inner>,
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::storage("donor registry lock poisoned")
}

impl DonorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, new: NewDonor, today: NaiveDate, rules: &EligibilityRules) -> DomainResult<Donor> {
        let donor = Donor::register(new, today, rules)?;

        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.ensure_email_free(donor.email(), None)?;
        let donor_id = *donor.id();
        inner.order.push(donor_id);
        inner.by_id.insert(donor_id, donor.clone());

        tracing::info!(
            donor_id = %donor_id,
            blood_group = %donor.blood_group(),
            eligible = donor.is_eligible(),
            "donor registered"
        );
        Ok(donor)
    }

    pub fn get(&self, donor_id: DonorId) -> DomainResult<Donor> {
        let inner = self.inner.read().map_err(poisoned)?;
        inner
            .by_id
            .get(&donor_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("donor {donor_id}")))
    }

    pub fn list_all(&self) -> DomainResult<Vec<Donor>> {
        self.filtered(|_| true)
    }

    pub fn by_blood_group(&self, blood_group: BloodGroup) -> DomainResult<Vec<Donor>> {
        self.filtered(|d| d.blood_group() == blood_group)
    }

    /// Donors currently flagged eligible. The donation cooldown is not
    /// considered here; it is checked when a donation is recorded.
    pub fn eligible(&self) -> DomainResult<Vec<Donor>> {
        self.filtered(Donor::is_eligible)
    }

    pub fn update_contact(&self, donor_id: DonorId, contact: DonorContact) -> DomainResult<Donor> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let mut updated = inner.get_mut(donor_id)?.clone();
        updated.update_contact(contact)?;
        inner.ensure_email_free(updated.email(), Some(donor_id))?;

        *inner.get_mut(donor_id)? = updated.clone();
        tracing::info!(donor_id = %donor_id, "donor contact updated");
        Ok(updated)
    }

    pub fn set_eligible(&self, donor_id: DonorId, eligible: bool) -> DomainResult<Donor> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let donor = inner.get_mut(donor_id)?;
        donor.set_eligible(eligible);
        tracing::info!(donor_id = %donor_id, eligible, "donor eligibility changed");
        Ok(donor.clone())
    }

    pub fn remove(&self, donor_id: DonorId) -> DomainResult<Donor> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let donor = inner
            .by_id
            .remove(&donor_id)
            .ok_or_else(|| DomainError::not_found(format!("donor {donor_id}")))?;
        inner.order.retain(|id| *id != donor_id);
        tracing::info!(donor_id = %donor_id, "donor removed");
        Ok(donor)
    }

    /// Check the donor may give blood on `today`, run `before_commit`, then
    /// note the donation, all while holding the registry lock.
    ///
    /// If the donor is ineligible or still in cooldown `before_commit` never
    /// runs; if `before_commit` fails the donor is left unchanged.
    pub fn record_donation_with<T, F>(
        &self,
        donor_id: DonorId,
        today: NaiveDate,
        rules: &EligibilityRules,
        before_commit: F,
    ) -> DomainResult<(Donor, T)>
    where
        F: FnOnce(&Donor) -> DomainResult<T>,
    {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let donor = inner.get_mut(donor_id)?;
        donor.ensure_can_donate(today, rules).inspect_err(|err| {
            tracing::warn!(donor_id = %donor_id, error = %err, "donation rejected")
        })?;

        let outcome = before_commit(&*donor)?;
        donor.record_donation(today);

        tracing::info!(
            donor_id = %donor_id,
            donation_count = donor.donation_count(),
            "donation recorded for donor"
        );
        Ok((donor.clone(), outcome))
    }

    fn filtered<P>(&self, predicate: P) -> DomainResult<Vec<Donor>>
    where
        P: Fn(&Donor) -> bool,
    {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.ordered().filter(|d| predicate(d)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2026, 10, 16)
    }

    fn new_donor(name: &str, email: Option<&str>, blood_group: BloodGroup, born: NaiveDate) -> NewDonor {
        NewDonor {
            date_of_birth: born,
            blood_group,
            contact: DonorContact {
                name: name.to_string(),
                phone_number: "0123456789".to_string(),
                email: email.map(str::to_string),
                address: "4 Mill Lane".to_string(),
            },
            last_donation_date: None,
        }
    }

    fn register(registry: &DonorRegistry, name: &str, email: Option<&str>, group: BloodGroup) -> Donor {
        registry
            .register(new_donor(name, email, group, date(1990, 3, 3)), today(), &EligibilityRules::default())
            .unwrap()
    }

    #[test]
    fn register_get_and_list_in_order() {
        let registry = DonorRegistry::new();
        let a = register(&registry, "Ana", Some("ana@example.org"), BloodGroup::APos);
        let b = register(&registry, "Ben", None, BloodGroup::ONeg);

        assert_eq!(registry.get(a.id_typed()).unwrap(), a);
        let names: Vec<_> = registry
            .list_all()
            .unwrap()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["Ana", "Ben"]);
        assert_eq!(registry.by_blood_group(BloodGroup::ONeg).unwrap(), vec![b]);
        assert!(matches!(
            registry.get(DonorId::new()),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn email_must_be_unique_ignoring_case() {
        let registry = DonorRegistry::new();
        register(&registry, "Ana", Some("ana@example.org"), BloodGroup::APos);

        let err = registry
            .register(
                new_donor("Anna", Some("ANA@example.org"), BloodGroup::BPos, date(1985, 1, 1)),
                today(),
                &EligibilityRules::default(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert_eq!(registry.list_all().unwrap().len(), 1);

        register(&registry, "Ben", None, BloodGroup::ONeg);
        register(&registry, "Cy", None, BloodGroup::ONeg);
        assert_eq!(registry.list_all().unwrap().len(), 3);
    }

    #[test]
    fn update_contact_checks_email_against_others() {
        let registry = DonorRegistry::new();
        let ana = register(&registry, "Ana", Some("ana@example.org"), BloodGroup::APos);
        let ben = register(&registry, "Ben", Some("ben@example.org"), BloodGroup::ONeg);

        let mut contact = ben.contact().clone();
        contact.email = Some("ana@example.org".to_string());
        assert!(registry.update_contact(ben.id_typed(), contact).is_err());
        assert_eq!(registry.get(ben.id_typed()).unwrap(), ben);

        let mut contact = ana.contact().clone();
        contact.phone_number = "9998887777".to_string();
        let updated = registry.update_contact(ana.id_typed(), contact).unwrap();
        assert_eq!(updated.contact().phone_number, "9998887777");
        assert_eq!(updated.email(), Some("ana@example.org"));
    }

    #[test]
    fn eligible_lists_only_flagged_donors() {
        let registry = DonorRegistry::new();
        let adult = register(&registry, "Ana", None, BloodGroup::APos);
        registry
            .register(
                new_donor("Kid", None, BloodGroup::APos, date(2015, 1, 1)),
                today(),
                &EligibilityRules::default(),
            )
            .unwrap();

        assert_eq!(registry.eligible().unwrap(), vec![adult.clone()]);
        registry.set_eligible(adult.id_typed(), false).unwrap();
        assert!(registry.eligible().unwrap().is_empty());
    }

    #[test]
    fn remove_deletes_and_frees_email() {
        let registry = DonorRegistry::new();
        let ana = register(&registry, "Ana", Some("ana@example.org"), BloodGroup::APos);

        assert_eq!(registry.remove(ana.id_typed()).unwrap(), ana);
        assert!(registry.list_all().unwrap().is_empty());
        assert!(matches!(
            registry.remove(ana.id_typed()),
            Err(DomainError::NotFound(_))
        ));
        register(&registry, "Ana", Some("ana@example.org"), BloodGroup::APos);
    }

    #[test]
    fn donation_hook_runs_only_for_eligible_donor() {
        let registry = DonorRegistry::new();
        let rules = EligibilityRules::default();
        let ana = register(&registry, "Ana", None, BloodGroup::APos);

        let (donor, units) = registry
            .record_donation_with(ana.id_typed(), today(), &rules, |d| {
                assert_eq!(d.blood_group(), BloodGroup::APos);
                Ok(1)
            })
            .unwrap();
        assert_eq!(units, 1);
        assert_eq!(donor.donation_count(), 1);

        let mut ran = false;
        let err = registry
            .record_donation_with(ana.id_typed(), date(2026, 12, 1), &rules, |_| {
                ran = true;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert!(!ran);
    }

    #[test]
    fn failing_hook_leaves_donor_unchanged() {
        let registry = DonorRegistry::new();
        let ana = register(&registry, "Ana", None, BloodGroup::APos);

        let err = registry
            .record_donation_with(ana.id_typed(), today(), &EligibilityRules::default(), |d| -> DomainResult<()> {
                Err(DomainError::UnknownGroup(d.blood_group()))
            })
            .unwrap_err();
        assert_eq!(err, DomainError::UnknownGroup(BloodGroup::APos));
        assert_eq!(registry.get(ana.id_typed()).unwrap(), ana);
    }
}
