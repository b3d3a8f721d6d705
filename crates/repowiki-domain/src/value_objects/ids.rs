//! Strong-typed UUID identifiers for domain entities.

crate::define_id!(RepositoryId, "Strong typed identifier for a tracked repository");
crate::define_id!(JobId, "Strong typed identifier for a pipeline task/job");
crate::define_id!(ChunkId, "Strong typed identifier for a semantic code chunk");
crate::define_id!(WikiSectionId, "Strong typed identifier for a wiki section");
crate::define_id!(WikiPageId, "Strong typed identifier for a wiki page");
