//! Contact use-case service.
//!
//! # Responsibility
//! - Enforce identity, uniqueness and existence rules around contact writes.
//! - Own the pagination contract for list and name-search reads.
//!
//! # Invariants
//! - `create`/`update` validate every field before touching the store.
//! - A failed operation leaves the store unchanged.
//! - `update_address` overwrites only the four address fields and applies no
//!   field validation.
//! - `update` does not re-check uniqueness; only `create` does.

use crate::model::contact::{Address, Contact, ContactId, ContactValidationError};
use crate::repo::contact_repo::{ContactListQuery, ContactRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ContactServiceError>;

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// Input failed one or more field-level rules.
    BadResource(Vec<ContactValidationError>),
    /// A create collided with an existing record.
    AlreadyExists(String),
    /// Target contact does not exist.
    NotFound(ContactId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ContactServiceError {
    /// Returns a stable machine-readable code for logs and responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadResource(_) => "bad_resource",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotFound(_) => "not_found",
            Self::Repo(_) => "store_failure",
        }
    }
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadResource(violations) => {
                write!(f, "invalid contact")?;
                for (index, violation) in violations.iter().enumerate() {
                    let separator = if index == 0 { ": " } else { "; " };
                    write!(f, "{separator}{violation}")?;
                }
                Ok(())
            }
            Self::AlreadyExists(message) => write!(f, "{message}"),
            Self::NotFound(id) => write!(f, "cannot find contact with id: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(violation) => Self::BadResource(vec![violation]),
            other => Self::Repo(other),
        }
    }
}

impl From<ContactValidationError> for ContactServiceError {
    fn from(value: ContactValidationError) -> Self {
        Self::BadResource(vec![value])
    }
}

/// One page of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl PageRequest {
    /// Builds a page request; non-positive page numbers are floored to 1.
    pub fn new(number: i64, size: u32) -> Self {
        let number = u32::try_from(number.max(1)).unwrap_or(u32::MAX);
        Self { number, size }
    }

    /// 1-based page number.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }
}

/// Contact service facade over a record store.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists one page of all contacts in ascending id order.
    pub fn list_all(&self, page: PageRequest) -> ServiceResult<Vec<Contact>> {
        self.list_page(None, page)
    }

    /// Lists one page of contacts whose name contains `name`, ignoring ASCII
    /// case. An empty `name` lists everything.
    pub fn list_by_name(&self, name: &str, page: PageRequest) -> ServiceResult<Vec<Contact>> {
        let filter = Some(name).filter(|value| !value.is_empty());
        self.list_page(filter.map(str::to_string), page)
    }

    /// Gets one contact by id.
    pub fn find_by_id(&self, id: ContactId) -> ServiceResult<Contact> {
        self.repo
            .get_contact(id)?
            .ok_or(ContactServiceError::NotFound(id))
    }

    /// Creates a contact and returns it with its store-assigned id.
    ///
    /// # Errors
    /// - `BadResource` when any field violates its constraint.
    /// - `AlreadyExists` when the input carries an id that is already taken,
    ///   or a contact with the same name and phone exists.
    pub fn create(&self, contact: &Contact) -> ServiceResult<Contact> {
        ensure_valid(contact)?;

        if let Some(id) = contact.id {
            if self.repo.contact_exists(id)? {
                return Err(ContactServiceError::AlreadyExists(format!(
                    "contact with id: {id} already exists"
                )));
            }
        }
        if let Some(existing) = self.repo.find_duplicate(contact)? {
            return Err(ContactServiceError::AlreadyExists(format!(
                "contact with the same name and phone already exists with id: {existing}"
            )));
        }

        let id = self.repo.insert_contact(contact)?;
        info!("event=contact_create module=service status=ok id={id}");
        self.repo.get_contact(id)?.ok_or_else(|| {
            ContactServiceError::Repo(RepoError::InvalidData(format!(
                "created contact {id} not found in read-back"
            )))
        })
    }

    /// Replaces every field of an existing contact.
    ///
    /// # Errors
    /// - `BadResource` when any field violates its constraint.
    /// - `NotFound` when `contact.id` is missing or unknown.
    pub fn update(&self, contact: &Contact) -> ServiceResult<()> {
        ensure_valid(contact)?;

        // Store ids start at 1, so 0 never names a record.
        let Some(id) = contact.id else {
            return Err(ContactServiceError::NotFound(0));
        };
        if !self.repo.contact_exists(id)? {
            return Err(ContactServiceError::NotFound(id));
        }

        self.repo.update_contact(contact)?;
        info!("event=contact_update module=service status=ok id={id}");
        Ok(())
    }

    /// Overwrites only the address lines and postal code of one contact.
    pub fn update_address(&self, id: ContactId, address: &Address) -> ServiceResult<()> {
        if !self.repo.contact_exists(id)? {
            return Err(ContactServiceError::NotFound(id));
        }

        self.repo.update_address(id, address)?;
        info!("event=contact_update_address module=service status=ok id={id}");
        Ok(())
    }

    /// Permanently removes one contact.
    pub fn delete_by_id(&self, id: ContactId) -> ServiceResult<()> {
        if !self.repo.contact_exists(id)? {
            return Err(ContactServiceError::NotFound(id));
        }

        self.repo.delete_contact(id)?;
        info!("event=contact_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Returns the number of stored contacts.
    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_contacts()?)
    }

    fn list_page(&self, name: Option<String>, page: PageRequest) -> ServiceResult<Vec<Contact>> {
        if page.size() == 0 {
            return Ok(Vec::new());
        }

        let query = ContactListQuery {
            name_contains: name,
            limit: Some(page.size()),
            offset: page.offset(),
        };
        Ok(self.repo.list_contacts(&query)?)
    }
}

fn ensure_valid(contact: &Contact) -> ServiceResult<()> {
    let violations = contact.violations();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ContactServiceError::BadResource(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactServiceError, PageRequest};
    use crate::model::contact::ContactValidationError;

    #[test]
    fn page_request_floors_non_positive_numbers() {
        assert_eq!(PageRequest::new(0, 5).number(), 1);
        assert_eq!(PageRequest::new(-3, 5).number(), 1);
        assert_eq!(PageRequest::new(3, 5).offset(), 10);
    }

    #[test]
    fn bad_resource_message_lists_every_violation() {
        let err = ContactServiceError::BadResource(vec![
            ContactValidationError::BlankName,
            ContactValidationError::InvalidPhone("abc".to_string()),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid contact: name cannot be blank; phone number `abc` is not valid"
        );
        assert_eq!(err.code(), "bad_resource");
    }
}
