//! Item registry use-case service.
//!
//! # Responsibility
//! - Create samples with their subsamples.
//! - Split, duplicate, rename and retag items.
//!
//! # Invariants
//! - Splits preserve the source total exactly.
//! - Duplicates never mutate their source and start unplaced.
//! - Every multi-item write goes through one store transaction.

use crate::model::container::Container;
use crate::model::item::{GlobalId, Item, ItemId, ItemKind};
use crate::model::quantity::{Quantity, QuantityError};
use crate::model::tag::normalize_tags;
use crate::repo::inventory_repo::InventoryStore;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;
use std::collections::BTreeMap;

/// Input for creating a sample with subsamples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSample {
    pub name: String,
    /// Total material, divided evenly across the subsamples.
    pub total_quantity: Option<Quantity>,
    pub subsample_count: usize,
    pub tags: Vec<String>,
}

impl NewSample {
    /// One subsample, no quantity, no tags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_quantity: None,
            subsample_count: 1,
            tags: Vec::new(),
        }
    }

    pub fn with_quantity(mut self, total_quantity: Quantity, subsample_count: usize) -> Self {
        self.total_quantity = Some(total_quantity);
        self.subsample_count = subsample_count;
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = tags.iter().map(|tag| tag.as_ref().to_string()).collect();
        self
    }
}

/// Stored sample with its subsamples in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSample {
    pub sample: Item,
    pub subsamples: Vec<Item>,
}

/// Item registry service facade.
pub struct ItemService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> ItemService<S> {
    /// Creates service from store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a sample and its subsamples in one transaction.
    ///
    /// Subsamples are named `<name>.01`, `<name>.02`, ... and share the
    /// sample's tags.
    pub fn create_sample(&self, input: &NewSample) -> ServiceResult<CreatedSample> {
        let name = normalize_name(&input.name)?;
        if input.subsample_count == 0 {
            return Err(QuantityError::InvalidSplit(0).into());
        }

        let shares: Vec<Option<Quantity>> = match input.total_quantity {
            Some(total) => total.split(input.subsample_count)?.into_iter().map(Some).collect(),
            None => vec![None; input.subsample_count],
        };

        let sample = Item::sample(name.as_str()).with_tags(&input.tags);
        let mut batch = Vec::with_capacity(input.subsample_count + 1);
        batch.push(sample.clone());
        for (index, share) in shares.into_iter().enumerate() {
            let mut subsample = Item::subsample(sample.id, format!("{name}.{:02}", index + 1));
            subsample.quantity = share;
            subsample.tags = sample.tags.clone();
            batch.push(subsample);
        }

        let mut stored = self.store.persist_items(&batch)?.into_iter();
        let sample = stored.next().ok_or_else(|| {
            ServiceError::InconsistentState("sample missing from batch result".to_string())
        })?;
        let subsamples: Vec<Item> = stored.collect();
        info!(
            "event=sample_create module=registry status=ok item={} subsamples={}",
            sample.id,
            subsamples.len()
        );
        Ok(CreatedSample { sample, subsamples })
    }

    /// Splits a subsample into `parts` new subsamples.
    ///
    /// Without `quantity_per_part` the whole source quantity is divided and
    /// the source keeps zero. With it, each part receives that amount and the
    /// source keeps the remainder.
    ///
    /// # Errors
    /// - `NotASubsample` for samples and containers.
    /// - `InvalidSplit` when `parts` is zero.
    /// - `MissingQuantity` when the source carries no quantity.
    /// - `InsufficientQuantity` when the parts exceed the source.
    /// - `IncompatibleUnits` when `quantity_per_part` is of another family.
    pub fn split_subsample(
        &self,
        subsample_id: ItemId,
        parts: usize,
        quantity_per_part: Option<Quantity>,
    ) -> ServiceResult<Vec<Item>> {
        let mut source = self.get_item(subsample_id)?;
        if source.kind != ItemKind::Subsample {
            return Err(ServiceError::NotASubsample(subsample_id));
        }
        if parts == 0 {
            return Err(QuantityError::InvalidSplit(parts).into());
        }
        let available = source
            .quantity
            .ok_or(ServiceError::MissingQuantity(subsample_id))?;

        let (shares, remaining) = match quantity_per_part {
            None => (available.split(parts)?, Quantity::zero(available.unit)),
            Some(per_part) => {
                let requested = per_part.multiply(parts as u64)?;
                let remaining = available.subtract(&requested).map_err(|err| match err {
                    QuantityError::NegativeQuantity => ServiceError::InsufficientQuantity {
                        available,
                        requested,
                    },
                    other => other.into(),
                })?;
                let remaining = remaining.convert_to(available.unit).unwrap_or(remaining);
                (vec![per_part; parts], remaining)
            }
        };

        let mut batch = Vec::with_capacity(parts + 1);
        for (index, share) in shares.into_iter().enumerate() {
            let name = format!("{}.{}", source.name, index + 1);
            let mut part = source.duplicate(Some(name.as_str()));
            part.quantity = Some(share);
            batch.push(part);
        }
        source.quantity = Some(remaining);
        batch.insert(0, source);

        let mut stored = self.store.persist_items(&batch)?;
        stored.remove(0);
        info!(
            "event=subsample_split module=registry status=ok item={} parts={}",
            subsample_id, parts
        );
        Ok(stored)
    }

    /// Copies an item into a fresh identity.
    ///
    /// Containers are copied with their layout and flags but no contents.
    pub fn duplicate_item(&self, item_id: ItemId, new_name: Option<&str>) -> ServiceResult<Item> {
        let source = self.get_item(item_id)?;
        let copy = source.duplicate(new_name);

        let stored = if source.kind == ItemKind::Container {
            let layout_source = self
                .store
                .fetch_container(item_id)?
                .ok_or(ServiceError::ContainerNotFound(item_id))?;
            let container = Container {
                id: copy.id,
                global_id: None,
                name: copy.name.clone(),
                layout: layout_source.layout,
                can_store_containers: layout_source.can_store_containers,
                can_store_samples: layout_source.can_store_samples,
                tags: copy.tags.clone(),
                derived_from: copy.derived_from,
                contents: BTreeMap::new(),
            };
            self.store.create_container(&container)?;
            self.get_item(copy.id)?
        } else {
            self.store.persist_item(&copy)?
        };

        info!(
            "event=item_duplicate module=registry status=ok item={} copy={}",
            item_id, stored.id
        );
        Ok(stored)
    }

    /// Renames an item; only metadata changes.
    pub fn rename_item(&self, item_id: ItemId, new_name: &str) -> ServiceResult<Item> {
        let mut item = self.get_item(item_id)?;
        item.rename(new_name)?;
        self.store.persist_item(&item).map_err(Into::into)
    }

    /// Replaces an item's tags with the normalized `tags`.
    pub fn set_item_tags<T: AsRef<str>>(&self, item_id: ItemId, tags: &[T]) -> ServiceResult<Item> {
        let mut item = self.get_item(item_id)?;
        item.tags = normalize_tags(tags);
        self.store.persist_item(&item).map_err(Into::into)
    }

    pub fn get_item(&self, item_id: ItemId) -> ServiceResult<Item> {
        self.store
            .fetch_item(item_id)?
            .ok_or(ServiceError::ItemNotFound(item_id))
    }

    /// Looks up an item by global id text such as `SS12`.
    pub fn get_item_by_global_id(&self, text: &str) -> ServiceResult<Item> {
        let global_id: GlobalId = text.parse()?;
        self.store
            .fetch_item_by_global_id(&global_id)?
            .ok_or(ServiceError::GlobalIdNotFound(global_id))
    }

    /// Lists a sample's subsamples in creation order.
    pub fn list_subsamples(&self, sample_id: ItemId) -> ServiceResult<Vec<Item>> {
        let sample = self.get_item(sample_id)?;
        if sample.kind != ItemKind::Sample {
            return Err(ServiceError::NotASample(sample_id));
        }
        self.store.list_subsamples(sample_id).map_err(Into::into)
    }

    /// Sums the quantities of a sample's subsamples.
    ///
    /// Returns `None` when no subsample carries a quantity.
    pub fn sample_total(&self, sample_id: ItemId) -> ServiceResult<Option<Quantity>> {
        let mut total: Option<Quantity> = None;
        for subsample in self.list_subsamples(sample_id)? {
            let Some(quantity) = subsample.quantity else {
                continue;
            };
            total = Some(match total {
                Some(sum) => sum.add(&quantity)?,
                None => quantity,
            });
        }
        Ok(total)
    }
}

fn normalize_name(value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{ItemService, NewSample};
    use crate::db::open_db_in_memory;
    use crate::model::quantity::Quantity;
    use crate::repo::inventory_repo::SqliteInventoryStore;
    use crate::service::error::ServiceError;

    #[test]
    fn create_sample_names_subsamples_in_order() {
        let conn = open_db_in_memory().unwrap();
        let service = ItemService::new(SqliteInventoryStore::try_new(&conn).unwrap());
        let created = service
            .create_sample(
                &NewSample::new("  Buffer A ")
                    .with_quantity(Quantity::parse("9 ml").unwrap(), 3)
                    .with_tags(&["buffer", " ph7 "]),
            )
            .unwrap();

        assert_eq!(created.sample.name, "Buffer A");
        let names: Vec<&str> = created
            .subsamples
            .iter()
            .map(|item| item.name.as_str())
            .collect();
        assert_eq!(names, vec!["Buffer A.01", "Buffer A.02", "Buffer A.03"]);
        assert!(created
            .subsamples
            .iter()
            .all(|item| item.quantity == Some(Quantity::parse("3 ml").unwrap())));
        assert_eq!(created.subsamples[0].tags.to_strings(), vec!["buffer", "ph7"]);
    }

    #[test]
    fn create_sample_rejects_blank_name() {
        let conn = open_db_in_memory().unwrap();
        let service = ItemService::new(SqliteInventoryStore::try_new(&conn).unwrap());
        let err = service.create_sample(&NewSample::new("   ")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidName));
    }

    #[test]
    fn sample_total_sums_subsamples() {
        let conn = open_db_in_memory().unwrap();
        let service = ItemService::new(SqliteInventoryStore::try_new(&conn).unwrap());
        let created = service
            .create_sample(&NewSample::new("salt").with_quantity(Quantity::parse("10 g").unwrap(), 3))
            .unwrap();

        let total = service.sample_total(created.sample.id).unwrap().unwrap();
        assert!(total.same_amount(&Quantity::parse("10 g").unwrap()).unwrap());
    }
}
