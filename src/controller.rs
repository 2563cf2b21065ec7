//! Controller façade
//!
//! Every call is one unit of work: a session is opened, one access-object
//! operation runs, the session commits on success or rolls back on error.
//! Records leave the controller as JSON field mappings.

use serde::Serialize;
use std::marker::PhantomData;
use store_object::{
    Dao, DaoError, Fields, FilterSpec, JoinSpec, OrderSpec, Page, Record, RecordId, RecordStore,
    Selector, DEFAULT_PAGE, DEFAULT_PER_PAGE,
};

const ACCESSING: &str = "accessing";
const SERIALIZING: &str = "serializing";

/// How `Controller::list` shapes its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    All,
    Paginated { page: i64, per_page: i64 },
}

impl ListMode {
    /// First page with the default page size
    pub fn paginated() -> Self {
        ListMode::Paginated {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn page(page: i64, per_page: i64) -> Self {
        ListMode::Paginated { page, per_page }
    }
}

/// Result of `Controller::list`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListView {
    All(Vec<Fields>),
    Paginated(Page<Fields>),
}

impl ListView {
    /// Records of the view, whichever its shape
    pub fn records(&self) -> &[Fields] {
        match self {
            ListView::All(records) => records,
            ListView::Paginated(page) => &page.data_set,
        }
    }

    pub fn into_page(self) -> Option<Page<Fields>> {
        match self {
            ListView::Paginated(page) => Some(page),
            ListView::All(_) => None,
        }
    }
}

/// What a write operation hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Returning {
    #[default]
    Id,
    /// The stored record, re-read in the same unit of work
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Saved {
    Id(RecordId),
    Object(Fields),
}

impl Saved {
    pub fn id(&self) -> Option<RecordId> {
        match self {
            Saved::Id(id) => Some(*id),
            Saved::Object(_) => None,
        }
    }

    pub fn object(&self) -> Option<&Fields> {
        match self {
            Saved::Object(fields) => Some(fields),
            Saved::Id(_) => None,
        }
    }
}

/// Per-model entry point over a record store
pub struct Controller<T: Record, S: RecordStore> {
    store: S,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record, S: RecordStore + Clone> Clone for Controller<T, S> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<T: Record, S: RecordStore> std::fmt::Debug for Controller<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("model", &T::schema().model)
            .finish()
    }
}

impl<T: Record, S: RecordStore> Controller<T, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The record matching `selector`, or an empty mapping
    pub async fn get(&self, selector: &Selector, joins: &JoinSpec) -> Result<Fields, DaoError> {
        let mut dao = self.open().await?;
        let result = async {
            match dao.get(selector, joins).await? {
                Some(record) => to_fields(&record, joins),
                None => Ok(Fields::new()),
            }
        }
        .await;
        Self::close(dao, result).await
    }

    /// Records matching `filter`, sorted by `order`, with `joins` loaded
    pub async fn list(
        &self,
        filter: &FilterSpec,
        order: &OrderSpec,
        joins: &JoinSpec,
        mode: ListMode,
    ) -> Result<ListView, DaoError> {
        let mut dao = self.open().await?;
        let result = async {
            let query = dao.list(filter, order, joins)?;
            match mode {
                ListMode::All => {
                    let records = dao.fetch(&query).await?;
                    let fields = records
                        .iter()
                        .map(|record| to_fields(record, joins))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(ListView::All(fields))
                }
                ListMode::Paginated { page, per_page } => {
                    let page = dao.paginate(&query, page, per_page).await?;
                    Ok(ListView::Paginated(
                        page.try_map(|record| to_fields(&record, joins))?,
                    ))
                }
            }
        }
        .await;
        Self::close(dao, result).await
    }

    pub async fn create<D: Serialize + ?Sized + Sync>(
        &self,
        data: &D,
        returning: Returning,
    ) -> Result<Saved, DaoError> {
        let mut dao = self.open().await?;
        let result = async {
            let id = dao.create(data).await?;
            Self::saved(&mut dao, id, returning).await
        }
        .await;
        Self::close(dao, result).await
    }

    pub async fn update<D: Serialize + ?Sized + Sync>(
        &self,
        selector: &Selector,
        data: &D,
        returning: Returning,
    ) -> Result<Saved, DaoError> {
        let mut dao = self.open().await?;
        let result = async {
            let id = dao.update(selector, data).await?;
            Self::saved(&mut dao, id, returning).await
        }
        .await;
        Self::close(dao, result).await
    }

    pub async fn upsert<D: Serialize + ?Sized + Sync>(
        &self,
        selector: &Selector,
        data: &D,
        returning: Returning,
    ) -> Result<Saved, DaoError> {
        let mut dao = self.open().await?;
        let result = async {
            let id = dao.upsert(selector, data).await?;
            Self::saved(&mut dao, id, returning).await
        }
        .await;
        Self::close(dao, result).await
    }

    /// Soft-delete every record matching `selector`
    pub async fn archive(&self, selector: &Selector) -> Result<(), DaoError> {
        let mut dao = self.open().await?;
        let result = dao.archive(selector).await.map(|_| ());
        Self::close(dao, result).await
    }

    pub async fn delete(&self, selector: &Selector) -> Result<(), DaoError> {
        let mut dao = self.open().await?;
        let result = dao.delete(selector).await.map(|_| ());
        Self::close(dao, result).await
    }

    async fn open(&self) -> Result<Dao<T, S::Session>, DaoError> {
        let session = self
            .store
            .begin()
            .await
            .map_err(|e| DaoError::persistence(T::schema().model, ACCESSING, e))?;
        crate::trace_log!("opened unit of work for {}", T::schema().model);
        Ok(Dao::new(session))
    }

    /// Commit on success, roll back on failure; the session is released either way
    async fn close<R>(dao: Dao<T, S::Session>, result: Result<R, DaoError>) -> Result<R, DaoError> {
        match result {
            Ok(value) => {
                dao.commit().await?;
                crate::trace_log!("committed unit of work for {}", T::schema().model);
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = dao.rollback().await {
                    tracing::warn!(
                        model = T::schema().model,
                        error = %rollback_err,
                        "rollback failed after error"
                    );
                }
                crate::trace_log!("rolled back unit of work for {}", T::schema().model);
                Err(err)
            }
        }
    }

    async fn saved(
        dao: &mut Dao<T, S::Session>,
        id: RecordId,
        returning: Returning,
    ) -> Result<Saved, DaoError> {
        match returning {
            Returning::Id => Ok(Saved::Id(id)),
            Returning::Object => {
                let selector = Selector::id(T::schema(), id);
                let record = dao.get(&selector, &JoinSpec::new()).await?.ok_or_else(|| {
                    DaoError::NotFound {
                        model: T::schema().model,
                        selector: selector.to_string(),
                    }
                })?;
                Ok(Saved::Object(to_fields(&record, &JoinSpec::new())?))
            }
        }
    }
}

fn to_fields<T: Record>(record: &T, joins: &JoinSpec) -> Result<Fields, DaoError> {
    record
        .to_dict(joins)
        .map_err(|e| DaoError::persistence(T::schema().model, SERIALIZING, e))
}
