//! Contact repository over a relational database through SeaORM.
use async_trait::async_trait;
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::NotSet;
use sea_orm::ActiveValue::Set;
use sea_orm::ConnectionTrait;
use sea_orm::DatabaseConnection;
use sea_orm::DbErr;
use sea_orm::EntityTrait;
use sea_orm::QueryOrder;
use sea_orm::Schema;
use tracing::instrument;

use crate::traits::Repository;
use crate::types::Contact;
use crate::types::ContactId;

pub mod contact {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "contacts")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id:      i32,
        pub name:    String,
        pub email:   String,
        pub phone:   String,
        pub address: String,
        pub user_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl From<contact::Model> for Contact {
    fn from(m: contact::Model) -> Self {
        Self {
            id:      m.id,
            name:    m.name,
            email:   m.email,
            phone:   m.phone,
            address: m.address,
            user_id: m.user_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeaOrmRepository {
    conn: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Create the `contacts` table from the entity definition unless it already exists.
    pub async fn create_schema(&self) -> Result<(), DbErr> {
        let backend = self.conn.get_database_backend();
        let mut stmt = Schema::new(backend).create_table_from_entity(contact::Entity);
        stmt.if_not_exists();
        self.conn.execute(backend.build(&stmt)).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for SeaOrmRepository {
    type Error = DbErr;

    #[instrument(level = "trace", skip(self))]
    async fn fetch_all(&self) -> Result<Vec<Contact>, Self::Error> {
        Ok(contact::Entity::find()
            .order_by_asc(contact::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Contact::from)
            .collect())
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_by_id(&self, id: ContactId) -> Result<Option<Contact>, Self::Error> {
        Ok(contact::Entity::find_by_id(id).one(&self.conn).await?.map(Contact::from))
    }

    #[instrument(level = "trace", skip(self, record))]
    async fn insert(&self, record: Contact) -> Result<Option<Contact>, Self::Error> {
        let am = contact::ActiveModel {
            id:      NotSet,
            name:    Set(record.name),
            email:   Set(record.email),
            phone:   Set(record.phone),
            address: Set(record.address),
            user_id: Set(record.user_id),
        };
        Ok(Some(am.insert(&self.conn).await?.into()))
    }

    #[instrument(level = "trace", skip(self, record))]
    async fn update(&self, id: ContactId, record: Contact) -> Result<Option<Contact>, Self::Error> {
        let Some(existing) = contact::Entity::find_by_id(id).one(&self.conn).await?
        else {
            return Ok(None);
        };
        let mut am: contact::ActiveModel = existing.into();
        am.name = Set(record.name);
        am.email = Set(record.email);
        am.phone = Set(record.phone);
        am.address = Set(record.address);
        am.user_id = Set(record.user_id);
        Ok(Some(am.update(&self.conn).await?.into()))
    }

    #[instrument(level = "trace", skip(self))]
    async fn delete(&self, id: ContactId) -> Result<bool, Self::Error> {
        let result = contact::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
