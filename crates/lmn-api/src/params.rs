//! Query-string parameters shared by the listing endpoints.

use lmn_core::store::{NameQuery, Page};
use serde::Deserialize;

/// `?limit=&offset=`
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl PageParams {
  pub fn page(&self) -> Page { Page { limit: self.limit, offset: self.offset } }
}

/// `?search_name=&limit=&offset=`
#[derive(Debug, Default, Deserialize)]
pub struct NameParams {
  pub search_name: Option<String>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl NameParams {
  pub fn into_query(self) -> NameQuery {
    NameQuery {
      search_name: self.search_name,
      page:        Page { limit: self.limit, offset: self.offset },
    }
  }
}
