use crate::error::Result;
use crate::rest::UnsplashHttpClient;
use crate::types::*;

impl UnsplashHttpClient {
    /// GET /photos - One filtered page of the editorial feed.
    ///
    /// Filters set to `all` are left out of the query.
    pub async fn list_photos(&self, request: &PageRequest) -> Result<PhotoPage> {
        let page = request.page.to_string();
        let per_page = request.page_size.to_string();
        let mut query = vec![
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
            ("order_by", request.filters.order_by.upstream_value()),
        ];
        if let Some(color) = request.filters.color.upstream_value() {
            query.push(("color", color));
        }
        if let Some(orientation) = request.filters.orientation.upstream_value() {
            query.push(("orientation", orientation));
        }

        let (payload, total): (ListPayload, _) = self.get("/photos", &query).await?;
        payload.into_page(total)
    }
}
