//! Loan renewal service

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use super::renewal::RenewalPolicy;
use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    models::{BookInstance, Capabilities, Capability},
    repository::InstanceStore,
};

/// What the renewal form shows before a librarian submits a date
#[derive(Debug, Clone)]
pub struct RenewalForm {
    pub instance: BookInstance,
    pub today: NaiveDate,
    pub suggested_due_back: NaiveDate,
    pub latest_due_back: NaiveDate,
}

#[derive(Clone)]
pub struct LoansService {
    instances: Arc<dyn InstanceStore>,
    policy: RenewalPolicy,
    clock: Arc<dyn Clock>,
}

impl LoansService {
    pub fn new(instances: Arc<dyn InstanceStore>, policy: RenewalPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            instances,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RenewalPolicy {
        &self.policy
    }

    /// Guard clauses shared by the form and the renewal itself
    async fn renewable_instance(
        &self,
        instance_id: Uuid,
        acting_user: &dyn Capabilities,
    ) -> AppResult<BookInstance> {
        acting_user.require(Capability::CanMarkReturned)?;

        let instance = self.instances.get_instance(instance_id).await?;
        if !instance.is_on_loan() {
            return Err(AppError::InvalidState(format!(
                "Book instance {} is not on loan ({})",
                instance_id, instance.status
            )));
        }
        Ok(instance)
    }

    /// Current state of a loan and the suggested renewal date
    pub async fn renewal_form(
        &self,
        instance_id: Uuid,
        acting_user: &dyn Capabilities,
    ) -> AppResult<RenewalForm> {
        let instance = self.renewable_instance(instance_id, acting_user).await?;
        let today = self.clock.today();
        Ok(RenewalForm {
            instance,
            today,
            suggested_due_back: self.policy.suggested_due_back(today),
            latest_due_back: self.policy.latest_due_back(today),
        })
    }

    /// Move the due date of a copy on loan to `proposed`
    pub async fn renew_loan(
        &self,
        instance_id: Uuid,
        proposed: NaiveDate,
        acting_user: &dyn Capabilities,
    ) -> AppResult<BookInstance> {
        self.renewable_instance(instance_id, acting_user).await?;

        let due_back = self.policy.validate_due_back(proposed, self.clock.today())?;

        // The store re-checks the status under its lock
        self.instances.renew_due_back(instance_id, due_back).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        models::{book_instance::CreateBookInstance, LoanStatus, UserClaims},
        repository::{MemoryRepository, MockInstanceStore},
        services::renewal::RenewalError,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn librarian() -> UserClaims {
        UserClaims::new(9, "librarian", vec![Capability::CanMarkReturned], 1)
    }

    fn reader() -> UserClaims {
        UserClaims::new(1, "reader", vec![Capability::CanManageCatalog], 1)
    }

    fn service_on(store: Arc<dyn InstanceStore>) -> LoansService {
        LoansService::new(
            store,
            RenewalPolicy::default(),
            Arc::new(FixedClock(date(2024, 1, 1))),
        )
    }

    async fn loaned_copy(repo: &MemoryRepository, status: LoanStatus) -> BookInstance {
        let on_loan = status == LoanStatus::OnLoan;
        repo.create_instance(&CreateBookInstance {
            book_id: None,
            imprint: "Vintage, 1995".to_string(),
            status,
            due_back: on_loan.then(|| date(2024, 1, 5)),
            borrower_id: on_loan.then_some(1),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_renewal_sets_due_back() {
        let repo = MemoryRepository::new();
        let copy = loaned_copy(&repo, LoanStatus::OnLoan).await;
        let service = service_on(Arc::new(repo.clone()));

        let renewed = service
            .renew_loan(copy.id, date(2024, 1, 15), &librarian())
            .await
            .unwrap();

        assert_eq!(renewed.due_back, Some(date(2024, 1, 15)));
        assert_eq!(
            repo.get_instance(copy.id).await.unwrap().due_back,
            Some(date(2024, 1, 15))
        );
    }

    #[tokio::test]
    async fn test_renewal_date_errors_leave_copy_untouched() {
        let repo = MemoryRepository::new();
        let copy = loaned_copy(&repo, LoanStatus::OnLoan).await;
        let service = service_on(Arc::new(repo.clone()));

        let past = service.renew_loan(copy.id, date(2023, 12, 31), &librarian()).await;
        assert!(matches!(past, Err(AppError::Renewal(RenewalError::PastDate))));

        let ahead = service.renew_loan(copy.id, date(2024, 2, 1), &librarian()).await;
        assert!(matches!(
            ahead,
            Err(AppError::Renewal(RenewalError::TooFarAhead { .. }))
        ));

        assert_eq!(
            repo.get_instance(copy.id).await.unwrap().due_back,
            Some(date(2024, 1, 5))
        );
    }

    #[tokio::test]
    async fn test_renewal_denied_without_touching_store() {
        // No expectations: any store call would panic
        let service = service_on(Arc::new(MockInstanceStore::new()));

        for proposed in [date(2024, 1, 15), date(2023, 1, 1), date(2025, 1, 1)] {
            let result = service.renew_loan(Uuid::new_v4(), proposed, &reader()).await;
            assert!(matches!(result, Err(AppError::PermissionDenied(_))));
        }
        let form = service.renewal_form(Uuid::new_v4(), &reader()).await;
        assert!(matches!(form, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_renewal_of_unknown_copy_not_found() {
        let mut store = MockInstanceStore::new();
        store
            .expect_get_instance()
            .times(1)
            .returning(|id| Err(AppError::NotFound(format!("Book instance {} not found", id))));
        store.expect_renew_due_back().never();
        let service = service_on(Arc::new(store));

        let result = service
            .renew_loan(Uuid::new_v4(), date(2024, 1, 15), &librarian())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_renewal_requires_copy_on_loan() {
        let repo = MemoryRepository::new();
        let service = service_on(Arc::new(repo.clone()));

        for status in [LoanStatus::Available, LoanStatus::Maintenance, LoanStatus::Reserved] {
            let copy = loaned_copy(&repo, status).await;
            let result = service
                .renew_loan(copy.id, date(2024, 1, 15), &librarian())
                .await;
            assert!(matches!(result, Err(AppError::InvalidState(_))));
        }
    }

    #[tokio::test]
    async fn test_renewal_form_suggests_three_weeks() {
        let repo = MemoryRepository::new();
        let copy = loaned_copy(&repo, LoanStatus::OnLoan).await;
        let service = service_on(Arc::new(repo));

        let form = service.renewal_form(copy.id, &librarian()).await.unwrap();
        assert_eq!(form.instance.id, copy.id);
        assert_eq!(form.today, date(2024, 1, 1));
        assert_eq!(form.suggested_due_back, date(2024, 1, 22));
        assert_eq!(form.latest_due_back, date(2024, 1, 29));
    }
}
