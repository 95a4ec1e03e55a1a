use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, PrimaryKeyTrait, QueryOrder, QuerySelect,
};
use std::fmt::Debug;

use crate::pagination::{Page, PageRequest};
use crate::specification::Specification;

pub trait MergeIntoActiveModel<ActiveModelType> {
    /// # Errors
    ///
    /// Returns a [`DbErr`] when the update cannot be applied to `existing`.
    fn merge_into_activemodel(self, existing: ActiveModelType) -> Result<ActiveModelType, DbErr>;
}

type PrimaryKeyValue<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// A REST resource backed by one entity, with criteria-driven queries.
///
/// List, page and count all run the select produced by
/// [`CRUDResource::create_specification`], so they agree on which rows match.
#[async_trait]
pub trait CRUDResource: Sized + Send + Sync
where
    Self::EntityType: EntityTrait + Send + Sync,
    Self::ActiveModelType: ActiveModelTrait + ActiveModelBehavior + Send + Sync,
    <Self::EntityType as EntityTrait>::Model: Sync + IntoActiveModel<Self::ActiveModelType>,
    PrimaryKeyValue<Self::EntityType>: From<i64>,
    Self: From<<Self::EntityType as EntityTrait>::Model>,
{
    type EntityType: EntityTrait + Send + Sync;
    type ColumnType: ColumnTrait + Copy + Debug + Send + Sync;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>;
    type CreateModel: Into<Self::ActiveModelType> + Send;
    type Criteria: Debug + Send + Sync;

    const ID_COLUMN: Self::ColumnType;
    const RESOURCE_NAME_SINGULAR: &str;
    const RESOURCE_NAME_PLURAL: &str;

    fn create_specification(criteria: &Self::Criteria) -> Specification<Self::EntityType>;

    async fn find_by_criteria(
        db: &DatabaseConnection,
        criteria: &Self::Criteria,
    ) -> Result<Vec<Self>, DbErr> {
        tracing::debug!(?criteria, resource = Self::RESOURCE_NAME_PLURAL, "find by criteria");
        let select = Self::create_specification(criteria)
            .select()
            .order_by(Self::ID_COLUMN, Order::Asc);
        let models = select.all(db).await?;
        Ok(models.into_iter().map(Self::from).collect())
    }

    /// Requested sort keys are applied in order, with the id appended as a
    /// final tie-breaker so pages are stable.
    async fn find_page_by_criteria(
        db: &DatabaseConnection,
        criteria: &Self::Criteria,
        page: &PageRequest<Self::ColumnType>,
    ) -> Result<Page<Self>, DbErr> {
        tracing::debug!(
            ?criteria,
            page = page.page,
            size = page.size,
            resource = Self::RESOURCE_NAME_PLURAL,
            "find page by criteria"
        );
        let (count_select, page_select) = {
            let specification = Self::create_specification(criteria);
            let page_select = page
                .sort
                .iter()
                .fold(specification.select(), |select, (column, order)| {
                    select.order_by(*column, order.clone())
                })
                .order_by(Self::ID_COLUMN, Order::Asc)
                .offset(page.offset())
                .limit(page.size);
            (specification.select(), page_select)
        };

        let total_elements = count_select.count(db).await?;
        let models = page_select.all(db).await?;

        Ok(Page {
            content: models.into_iter().map(Self::from).collect(),
            number: page.page,
            size: page.size,
            total_elements,
        })
    }

    async fn count_by_criteria(
        db: &DatabaseConnection,
        criteria: &Self::Criteria,
    ) -> Result<u64, DbErr> {
        tracing::debug!(?criteria, resource = Self::RESOURCE_NAME_PLURAL, "count by criteria");
        let select = Self::create_specification(criteria).select();
        select.count(db).await
    }

    async fn get_one(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        let model = Self::EntityType::find_by_id(id).one(db).await?;
        Ok(model.map(Self::from))
    }

    async fn exists(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let matching = Self::EntityType::find_by_id(id).count(db).await?;
        Ok(matching > 0)
    }

    async fn create(
        db: &DatabaseConnection,
        create_model: Self::CreateModel,
    ) -> Result<Self, DbErr> {
        let active_model: Self::ActiveModelType = create_model.into();
        let model = active_model.insert(db).await?;
        Ok(Self::from(model))
    }

    /// Merges `update_model` into the stored row. `Ok(None)` if there is no
    /// row with `id`.
    async fn update<U>(
        db: &DatabaseConnection,
        id: i64,
        update_model: U,
    ) -> Result<Option<Self>, DbErr>
    where
        U: MergeIntoActiveModel<Self::ActiveModelType> + Send,
    {
        let Some(model) = Self::EntityType::find_by_id(id).one(db).await? else {
            return Ok(None);
        };
        let merged = update_model.merge_into_activemodel(model.clone().into_active_model())?;
        if !merged.is_changed() {
            return Ok(Some(Self::from(model)));
        }
        let updated = merged.update(db).await?;
        Ok(Some(Self::from(updated)))
    }

    /// Returns the number of deleted rows; deleting a missing id is not an error.
    async fn delete(db: &DatabaseConnection, id: i64) -> Result<u64, DbErr> {
        let result = Self::EntityType::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}
