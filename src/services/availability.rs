//! Catalog counters and loan listings

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{BookInstance, Capabilities, Capability, CatalogSummary, EntityKind, LoanStatus},
    repository::{AuthorStore, BookStore, CatalogStore, GenreStore, InstanceStore, LanguageStore},
};

/// Read-only queries; every call goes to the store, nothing is cached
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn CatalogStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Number of records of one kind
    pub async fn count_all(&self, kind: EntityKind) -> AppResult<i64> {
        match kind {
            EntityKind::Book => self.store.count_books().await,
            EntityKind::Author => self.store.count_authors().await,
            EntityKind::Genre => self.store.count_genres().await,
            EntityKind::Language => self.store.count_languages().await,
            EntityKind::BookInstance => self.store.count_instances(None).await,
        }
    }

    /// Copies that can be lent right now
    pub async fn count_available(&self) -> AppResult<i64> {
        self.store.count_instances(Some(LoanStatus::Available)).await
    }

    /// Copies on loan to one borrower, earliest due first
    pub async fn list_loans_for_user(&self, user_id: i32) -> AppResult<Vec<BookInstance>> {
        self.store
            .list_instances_with_status(LoanStatus::OnLoan, Some(user_id))
            .await
    }

    /// Every copy on loan, earliest due first. Librarians only.
    pub async fn list_all_loans(&self, acting_user: &dyn Capabilities) -> AppResult<Vec<BookInstance>> {
        acting_user.require(Capability::CanMarkReturned)?;
        self.store
            .list_instances_with_status(LoanStatus::OnLoan, None)
            .await
    }

    /// Figures for the catalog home page
    pub async fn summary(&self) -> AppResult<CatalogSummary> {
        Ok(CatalogSummary {
            num_books: self.count_all(EntityKind::Book).await?,
            num_instances: self.count_all(EntityKind::BookInstance).await?,
            num_instances_available: self.count_available().await?,
            num_authors: self.count_all(EntityKind::Author).await?,
            num_genres: self.count_all(EntityKind::Genre).await?,
            num_languages: self.count_all(EntityKind::Language).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        error::AppError,
        models::{author::CreateAuthor, book_instance::CreateBookInstance, UserClaims},
        repository::{AuthorStore, InstanceStore, MemoryRepository},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn lend(repo: &MemoryRepository, borrower: i32, due: NaiveDate) -> BookInstance {
        repo.create_instance(&CreateBookInstance {
            book_id: None,
            imprint: "Gollancz, 2015".to_string(),
            status: LoanStatus::OnLoan,
            due_back: Some(due),
            borrower_id: Some(borrower),
        })
        .await
        .unwrap()
    }

    fn service(repo: &MemoryRepository) -> AvailabilityService {
        AvailabilityService::new(Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn test_all_loans_ordered_by_due_date() {
        let repo = MemoryRepository::new();
        lend(&repo, 1, date(2024, 3, 1)).await;
        lend(&repo, 2, date(2024, 1, 10)).await;
        lend(&repo, 1, date(2024, 2, 5)).await;

        let librarian = UserClaims::new(9, "librarian", vec![Capability::CanMarkReturned], 1);
        let loans = service(&repo).list_all_loans(&librarian).await.unwrap();
        let dues: Vec<_> = loans.iter().filter_map(|l| l.due_back).collect();
        assert_eq!(dues, vec![date(2024, 1, 10), date(2024, 2, 5), date(2024, 3, 1)]);
    }

    #[tokio::test]
    async fn test_all_loans_requires_capability() {
        let repo = MemoryRepository::new();
        lend(&repo, 1, date(2024, 3, 1)).await;

        let reader = UserClaims::new(1, "reader", vec![], 1);
        assert!(matches!(
            service(&repo).list_all_loans(&reader).await,
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_loans_for_user_only_own_copies_on_loan() {
        let repo = MemoryRepository::new();
        lend(&repo, 1, date(2024, 3, 1)).await;
        lend(&repo, 2, date(2024, 1, 10)).await;
        lend(&repo, 1, date(2024, 2, 5)).await;
        repo.create_instance(&CreateBookInstance {
            book_id: None,
            imprint: "Gollancz, 2015".to_string(),
            status: LoanStatus::Reserved,
            due_back: None,
            borrower_id: Some(1),
        })
        .await
        .unwrap();

        let mine = service(&repo).list_loans_for_user(1).await.unwrap();
        let dues: Vec<_> = mine.iter().filter_map(|l| l.due_back).collect();
        assert_eq!(dues, vec![date(2024, 2, 5), date(2024, 3, 1)]);
        assert!(mine.iter().all(|l| l.borrower_id == Some(1)));
    }

    #[tokio::test]
    async fn test_counts_reflect_current_state() {
        let repo = MemoryRepository::new();
        let svc = service(&repo);
        assert_eq!(svc.count_available().await.unwrap(), 0);

        let copy = repo
            .create_instance(&CreateBookInstance {
                book_id: None,
                imprint: "Ace, 1990".to_string(),
                status: LoanStatus::Available,
                due_back: None,
                borrower_id: None,
            })
            .await
            .unwrap();
        lend(&repo, 1, date(2024, 3, 1)).await;
        repo.create_author(&CreateAuthor {
            first_name: "Frank".to_string(),
            last_name: "Herbert".to_string(),
            date_of_birth: None,
            date_of_death: None,
        })
        .await
        .unwrap();

        assert_eq!(svc.count_available().await.unwrap(), 1);
        assert_eq!(svc.count_all(EntityKind::BookInstance).await.unwrap(), 2);
        assert_eq!(svc.count_all(EntityKind::Author).await.unwrap(), 1);

        repo.delete_instance(copy.id).await.unwrap();
        let summary = svc.summary().await.unwrap();
        assert_eq!(summary.num_instances, 1);
        assert_eq!(summary.num_instances_available, 0);
        assert_eq!(summary.num_books, 0);
    }
}
