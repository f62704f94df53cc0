use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;

use crate::error::StoreError;
use crate::letter::Letter;

/// Item-level access to the letters table, keyed by `letter_id`.
#[async_trait]
pub(crate) trait LetterStore: Send + Sync {
    async fn put_letter(&self, letter: &Letter) -> Result<(), StoreError>;

    async fn get_letter(&self, letter_id: &str) -> Result<Option<Letter>, StoreError>;

    /// Initialise-if-absent then add one; returns the new count. Fails
    /// rather than upserting when the letter is gone.
    async fn increment_views(&self, letter_id: &str) -> Result<u64, StoreError>;

    async fn delete_letter(&self, letter_id: &str) -> Result<(), StoreError>;
}

pub(crate) struct DynamoLetterStore {
    client: Client,
    table: String,
}

impl DynamoLetterStore {
    pub(crate) fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn key(letter_id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([(
            "letter_id".to_string(),
            AttributeValue::S(letter_id.to_string()),
        )])
    }
}

fn sdk_error<E: std::error::Error>(err: E) -> StoreError {
    StoreError::Sdk(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl LetterStore for DynamoLetterStore {
    async fn put_letter(&self, letter: &Letter) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_item(letter)))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_letter(&self, letter_id: &str) -> Result<Option<Letter>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(Self::key(letter_id)))
            .send()
            .await
            .map_err(sdk_error)?;

        output.item().map(from_item).transpose()
    }

    async fn increment_views(&self, letter_id: &str) -> Result<u64, StoreError> {
        // `views` is a DynamoDB reserved word, hence the #v alias.
        let output = self
            .client
            .update_item()
            .table_name(&self.table)
            .set_key(Some(Self::key(letter_id)))
            .condition_expression("attribute_exists(letter_id)")
            .update_expression("SET #v = if_not_exists(#v, :start) + :inc")
            .expression_attribute_names("#v", "views")
            .expression_attribute_values(":inc", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":start", AttributeValue::N("0".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(sdk_error)?;

        match output.attributes().and_then(|attrs| attrs.get("views")) {
            Some(views) => number(views, "views"),
            None => Ok(1),
        }
    }

    async fn delete_letter(&self, letter_id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .set_key(Some(Self::key(letter_id)))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}

pub(crate) fn to_item(letter: &Letter) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(
        "letter_id".to_string(),
        AttributeValue::S(letter.letter_id.clone()),
    );
    item.insert("sender".to_string(), AttributeValue::S(letter.sender.clone()));
    item.insert(
        "receiver".to_string(),
        AttributeValue::S(letter.receiver.clone()),
    );
    item.insert("content".to_string(), AttributeValue::S(letter.content.clone()));
    item.insert(
        "is_anonymous".to_string(),
        AttributeValue::Bool(letter.is_anonymous),
    );
    item.insert("is_public".to_string(), AttributeValue::Bool(letter.is_public));
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(letter.created_at.clone()),
    );
    item.insert(
        "expiry_date".to_string(),
        match &letter.expiry_date {
            Some(at) => AttributeValue::S(at.clone()),
            None => AttributeValue::Null(true),
        },
    );
    item.insert("views".to_string(), AttributeValue::N(letter.views.to_string()));
    item
}

pub(crate) fn from_item(item: &HashMap<String, AttributeValue>) -> Result<Letter, StoreError> {
    let string = |name: &'static str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or(StoreError::MalformedItem(name))
    };
    let flag = |name: &'static str| match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(false),
        Some(AttributeValue::Bool(b)) => Ok(*b),
        Some(_) => Err(StoreError::MalformedItem(name)),
    };

    let expiry_date = match item.get("expiry_date") {
        None | Some(AttributeValue::Null(_)) => None,
        Some(AttributeValue::S(at)) if at.is_empty() => None,
        Some(AttributeValue::S(at)) => Some(at.clone()),
        Some(_) => return Err(StoreError::MalformedItem("expiry_date")),
    };
    let views = match item.get("views") {
        Some(views) => number(views, "views")?,
        None => 0,
    };

    Ok(Letter {
        letter_id: string("letter_id")?,
        sender: string("sender")?,
        receiver: string("receiver")?,
        content: string("content")?,
        is_anonymous: flag("is_anonymous")?,
        is_public: flag("is_public")?,
        created_at: string("created_at")?,
        expiry_date,
        views,
    })
}

fn number(value: &AttributeValue, name: &'static str) -> Result<u64, StoreError> {
    value
        .as_n()
        .ok()
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or(StoreError::MalformedItem(name))
}

#[cfg(test)]
pub(crate) use memory::MemoryLetterStore;


#[cfg(test)]
mod tests {
    use super::*;

    fn letter(expiry_date: Option<&str>) -> Letter {
        Letter {
            letter_id: "3f1c".to_string(),
            sender: "Alice".to_string(),
            receiver: "Bob".to_string(),
            content: "Hi".to_string(),
            is_anonymous: true,
            is_public: false,
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            expiry_date: expiry_date.map(str::to_string),
            views: 4,
        }
    }

    #[test]
    fn item_attribute_types() {
        let item = to_item(&letter(None));
        assert_eq!(item["expiry_date"], AttributeValue::Null(true));
        assert_eq!(item["views"], AttributeValue::N("4".to_string()));
        assert_eq!(item["is_anonymous"], AttributeValue::Bool(true));
        assert_eq!(from_item(&item).unwrap(), letter(None));

        let expiring = letter(Some("2024-01-08T00:00:00.000000Z"));
        assert_eq!(from_item(&to_item(&expiring)).unwrap(), expiring);
    }

    #[test]
    fn missing_attributes() {
        let mut item = to_item(&letter(None));
        item.remove("views");
        item.remove("is_public");
        item.remove("expiry_date");
        let parsed = from_item(&item).unwrap();
        assert_eq!(parsed.views, 0);
        assert!(!parsed.is_public);
        assert_eq!(parsed.expiry_date, None);

        item.remove("receiver");
        assert!(matches!(
            from_item(&item),
            Err(StoreError::MalformedItem("receiver"))
        ));
    }

    #[test]
    fn rejects_non_numeric_views() {
        let mut item = to_item(&letter(None));
        item.insert("views".to_string(), AttributeValue::S("many".to_string()));
        assert!(matches!(from_item(&item), Err(StoreError::MalformedItem("views"))));
    }
}
