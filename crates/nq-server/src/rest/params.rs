//! Listing query-string parsing
//!
//! Repeated keys (`?tags=a&tags=b`) and the bracket form (`?tags[]=a`) both
//! collect into a list. `search` keeps its last value.

use nq_core::ListParams;

pub fn parse_list_params(raw: Option<&str>) -> ListParams {
    let mut params = ListParams::new();
    let Some(raw) = raw else {
        return params;
    };

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "tags" | "tags[]" => params.tags.push(value.into_owned()),
            "categories" | "categories[]" => params.categories.push(value.into_owned()),
            "search" => params.search = Some(value.into_owned()),
            _ => {}
        }
    }

    params
}
