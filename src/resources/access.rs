use crate::{
    Dispatch, Operation, ProxmoxGateway, ProxmoxResult, RoleRecord, UserRecord,
    core::application::normalizer::{
        self,
        raw::{RawRole, RawUser},
    },
};

impl<D: Dispatch> ProxmoxGateway<D> {
    pub async fn users(&self) -> ProxmoxResult<Vec<UserRecord>> {
        let raw: Vec<RawUser> = self.fetch_records(&Operation::Users).await?;
        Ok(raw.into_iter().filter_map(normalizer::normalize_user).collect())
    }

    /// Roles with their privileges sorted by name.
    pub async fn roles(&self) -> ProxmoxResult<Vec<RoleRecord>> {
        let raw: Vec<RawRole> = self.fetch_records(&Operation::Roles).await?;
        Ok(raw.into_iter().filter_map(normalizer::normalize_role).collect())
    }
}
