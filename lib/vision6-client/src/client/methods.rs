//! Named convenience methods over the generic `call` primitive.
//!
//! Each method shapes its defaults and fixed argument order, then delegates
//! to [`Vision6Client::call`]; shape correctness is entirely the validator's
//! responsibility. Method docs link to the upstream API reference.

use std::fmt;

use serde_json::{Value, json};

use super::Vision6Client;
use crate::error::Error;

/// Sort direction for the search methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending (`"ASC"`, the usual default).
    Asc,
    /// Descending (`"DESC"`).
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn criteria_or_empty(criteria: Option<Vec<Value>>) -> Value {
    Value::Array(criteria.unwrap_or_default())
}

fn string_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn order_or_null(order: Option<SortOrder>) -> Value {
    order.map_or(Value::Null, |order| Value::from(order.as_str()))
}

fn returned_fields_or_all(fields: Option<Vec<String>>) -> Value {
    json!(fields.unwrap_or_else(|| vec!["all".to_owned()]))
}

// List and field methods
impl Vision6Client {
    /// <http://developers.vision6.com.au/3.0/method/addfield>
    pub async fn add_field(&self, list_id: u64, field_details: Value) -> Result<Value, Error> {
        self.call("addField", [json!(list_id), field_details]).await
    }

    /// <http://developers.vision6.com.au/3.0/method/addlist>
    pub async fn add_list(&self, list_details: Value) -> Result<Value, Error> {
        self.call("addList", [list_details]).await
    }

    /// <http://developers.vision6.com.au/3.0/method/clearlist>
    pub async fn clear_list(&self, list_id: u64) -> Result<Value, Error> {
        self.call("clearList", [json!(list_id)]).await
    }

    /// <http://developers.vision6.com.au/3.0/method/countfields>
    pub async fn count_fields(
        &self,
        list_id: u64,
        search_criteria: Option<Vec<Value>>,
    ) -> Result<Value, Error> {
        self.call(
            "countFields",
            [json!(list_id), criteria_or_empty(search_criteria)],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/countlists>
    pub async fn count_lists(&self, search_criteria: Option<Vec<Value>>) -> Result<Value, Error> {
        self.call("countLists", [criteria_or_empty(search_criteria)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/deletefield>
    pub async fn delete_field(&self, list_id: u64, field_id: u64) -> Result<Value, Error> {
        self.call("deleteField", [json!(list_id), json!(field_id)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/deletelist>
    pub async fn delete_list(&self, list_id: u64) -> Result<Value, Error> {
        self.call("deleteList", [json!(list_id)]).await
    }

    /// <http://developers.vision6.com.au/3.0/method/editfield>
    pub async fn edit_field(&self, list_id: u64, field_details: Value) -> Result<Value, Error> {
        self.call("editField", [json!(list_id), field_details])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/editlist>
    pub async fn edit_list(&self, list_details: Value) -> Result<Value, Error> {
        self.call("editList", [list_details]).await
    }

    /// <http://developers.vision6.com.au/3.0/method/getfieldbyid>
    pub async fn get_field_by_id(&self, list_id: u64, field_id: u64) -> Result<Value, Error> {
        self.call("getFieldById", [json!(list_id), json!(field_id)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/getfolderidforfield>
    pub async fn get_folder_id_for_field(
        &self,
        list_id: u64,
        field_id: u64,
    ) -> Result<Value, Error> {
        self.call("getFolderIdForField", [json!(list_id), json!(field_id)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/getlistbyid>
    pub async fn get_list_by_id(&self, list_id: u64) -> Result<Value, Error> {
        self.call("getListById", [json!(list_id)]).await
    }

    /// <http://developers.vision6.com.au/3.0/method/gettimezonelist>
    pub async fn get_timezone_list(&self) -> Result<Value, Error> {
        self.call("getTimezoneList", []).await
    }

    /// <http://developers.vision6.com.au/3.0/method/searchfields>
    pub async fn search_fields(
        &self,
        list_id: u64,
        search_criteria: Option<Vec<Value>>,
        limit: Option<u64>,
        offset: Option<u64>,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Value, Error> {
        self.call(
            "searchFields",
            [
                json!(list_id),
                criteria_or_empty(search_criteria),
                json!(limit.unwrap_or(0)),
                json!(offset.unwrap_or(0)),
                json!(sort_by.unwrap_or("name")),
                json!(sort_order.unwrap_or(SortOrder::Asc).as_str()),
            ],
        )
        .await
    }

    /// Searches lists, defaulting to all lists sorted by name ascending with
    /// a limit of 100.
    ///
    /// <http://developers.vision6.com.au/3.0/method/searchlists>
    pub async fn search_lists(
        &self,
        criteria: Option<Vec<Value>>,
        limit: Option<u64>,
        offset: Option<u64>,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Value, Error> {
        self.call(
            "searchLists",
            [
                criteria_or_empty(criteria),
                json!(limit.unwrap_or(100)),
                json!(offset.unwrap_or(0)),
                json!(sort_by.unwrap_or("name")),
                json!(sort_order.unwrap_or(SortOrder::Asc).as_str()),
            ],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/setfieldfolderid>
    pub async fn set_field_folder_id(
        &self,
        list_id: u64,
        field_id: u64,
        folder_id: &str,
    ) -> Result<Value, Error> {
        self.call(
            "setFieldFolderId",
            [json!(list_id), json!(field_id), json!(folder_id)],
        )
        .await
    }
}

// Contact methods
impl Vision6Client {
    /// <http://developers.vision6.com.au/3.0/method/addcontacts>
    pub async fn add_contacts(
        &self,
        list_id: u64,
        contacts: Vec<Value>,
        overwrite: Option<bool>,
        remove_unsubscribers: Option<u64>,
    ) -> Result<Value, Error> {
        self.call(
            "addContacts",
            [
                json!(list_id),
                Value::Array(contacts),
                json!(overwrite.unwrap_or(false)),
                json!(remove_unsubscribers.unwrap_or(0)),
            ],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/confirmcontact>
    pub async fn confirm_contact(&self, list_id: u64, contact_id: u64) -> Result<Value, Error> {
        self.call("confirmContact", [json!(list_id), json!(contact_id)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/countcontacts>
    pub async fn count_contacts(
        &self,
        list_id: u64,
        search_criteria: Option<Vec<Value>>,
    ) -> Result<Value, Error> {
        self.call(
            "countContacts",
            [json!(list_id), criteria_or_empty(search_criteria)],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/countpreviousunsubscribers>
    pub async fn count_previous_unsubscribers(
        &self,
        list_id: Option<u64>,
        criteria: Option<Vec<Value>>,
    ) -> Result<Value, Error> {
        self.call(
            "countPreviousUnsubscribers",
            [json!(list_id.unwrap_or(0)), criteria_or_empty(criteria)],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/deactivatecontact>
    pub async fn deactivate_contact(&self, list_id: u64, contact_id: u64) -> Result<Value, Error> {
        self.call("deactivateContact", [json!(list_id), json!(contact_id)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/deletecontacts>
    #[allow(clippy::too_many_arguments)]
    pub async fn delete_contacts(
        &self,
        list_id: u64,
        contact_ids: Vec<u64>,
        search_criteria: Option<Vec<Value>>,
        limit: Option<u64>,
        offset: Option<u64>,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Value, Error> {
        self.call(
            "deleteContacts",
            [
                json!(list_id),
                json!(contact_ids),
                criteria_or_empty(search_criteria),
                json!(limit.unwrap_or(0)),
                json!(offset.unwrap_or(0)),
                string_or_null(sort_by),
                order_or_null(sort_order),
            ],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/editcontacts>
    pub async fn edit_contacts(
        &self,
        list_id: u64,
        contacts: Vec<Value>,
        trigger_update_profile: Option<bool>,
    ) -> Result<Value, Error> {
        self.call(
            "editContacts",
            [
                json!(list_id),
                Value::Array(contacts),
                json!(trigger_update_profile.unwrap_or(false)),
            ],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/getcontactbyid>
    pub async fn get_contact_by_id(
        &self,
        list_id: u64,
        contact_id: u64,
        returned_fields: Option<Vec<String>>,
    ) -> Result<Value, Error> {
        self.call(
            "getContactById",
            [
                json!(list_id),
                json!(contact_id),
                returned_fields_or_all(returned_fields),
            ],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/reactivatecontact>
    pub async fn reactivate_contact(&self, list_id: u64, contact_id: u64) -> Result<Value, Error> {
        self.call("reactivateContact", [json!(list_id), json!(contact_id)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/resubscribecontact>
    pub async fn resubscribe_contact(&self, list_id: u64, contact_id: u64) -> Result<Value, Error> {
        self.call("resubscribeContact", [json!(list_id), json!(contact_id)])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/searchcontacts>
    #[allow(clippy::too_many_arguments)]
    pub async fn search_contacts(
        &self,
        list_id: u64,
        search_criteria: Option<Vec<Value>>,
        limit: Option<u64>,
        offset: Option<u64>,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
        returned_fields: Option<Vec<String>>,
    ) -> Result<Value, Error> {
        self.call(
            "searchContacts",
            [
                json!(list_id),
                criteria_or_empty(search_criteria),
                json!(limit.unwrap_or(0)),
                json!(offset.unwrap_or(0)),
                string_or_null(sort_by),
                order_or_null(sort_order),
                returned_fields_or_all(returned_fields),
            ],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/searchpreviousunsubscribers>
    pub async fn search_previous_unsubscribers(
        &self,
        list_id: Option<u64>,
        search_criteria: Option<Vec<Value>>,
        limit: Option<u64>,
        offset: Option<u64>,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Result<Value, Error> {
        self.call(
            "searchPreviousUnsubscribers",
            [
                json!(list_id.unwrap_or(0)),
                criteria_or_empty(search_criteria),
                json!(limit.unwrap_or(0)),
                json!(offset.unwrap_or(0)),
                string_or_null(sort_by),
                order_or_null(sort_order),
            ],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/subscribecontact>
    pub async fn subscribe_contact(
        &self,
        list_id: u64,
        contact_details: Value,
    ) -> Result<Value, Error> {
        self.call("subscribeContact", [json!(list_id), contact_details])
            .await
    }

    /// <http://developers.vision6.com.au/3.0/method/unsubscribecontact>
    pub async fn unsubscribe_contact(
        &self,
        list_id: Option<u64>,
        email_address: &str,
    ) -> Result<Value, Error> {
        self.call(
            "unsubscribeContact",
            [json!(list_id.unwrap_or(0)), json!(email_address)],
        )
        .await
    }

    /// <http://developers.vision6.com.au/3.0/method/unsubscribecontactbyid>
    pub async fn unsubscribe_contact_by_id(
        &self,
        list_id: u64,
        contact_id: u64,
    ) -> Result<Value, Error> {
        self.call("unsubscribeContactById", [json!(list_id), json!(contact_id)])
            .await
    }
}
