/// Name of the warehouse connection generation SQL runs on.
/// Example: `vertex_bigquery`
pub type ConnectionName = String;
/// Fully qualified remote model identifier.
/// Example: `my-project.llm.gemini_pro`
pub type ModelId = String;
/// Handle returned by the query service for a created SQL query.
/// Example: `Aq3xZ9`
pub type QuerySlug = String;
/// Fully rendered prompt text handed to the model.
pub type PromptText = String;
/// Rendered SQL statement text.
pub type SqlText = String;
/// One flattened result row.
/// Example: `orders.status:complete,count complete:42`
pub type FlatRow = String;
