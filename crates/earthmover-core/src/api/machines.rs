//! Machine catalog and operator resolution.

use super::{ApiClient, ApiError, ApiResult};
use crate::models::{Machine, OperatorRef};

impl ApiClient {
    /// Full machine catalog.
    pub async fn machines(&self) -> ApiResult<Vec<Machine>> {
        self.get_data("v1/machines").await
    }

    /// One machine's details.
    pub async fn machine(&self, machine_id: i64) -> ApiResult<Machine> {
        self.get_data(&format!("v1/machines/{machine_id}")).await
    }

    /// Resolve the operator assigned to a machine.
    ///
    /// The backend reports "no operator" three different ways depending on
    /// the endpoint's age: a failure envelope, a success envelope with no
    /// data, or an operator record with a zero/negative id. All of them
    /// collapse into [`ApiError::NoOperatorAssigned`].
    pub async fn machine_operator(&self, machine_id: i64) -> ApiResult<OperatorRef> {
        let operator: OperatorRef = match self
            .get_data(&format!("v1/machines/{machine_id}/operator"))
            .await
        {
            Ok(operator) => operator,
            Err(ApiError::Rejected(_) | ApiError::MissingData) => {
                return Err(ApiError::NoOperatorAssigned { machine_id });
            }
            Err(error) => return Err(error),
        };

        if operator.id <= 0 {
            return Err(ApiError::NoOperatorAssigned { machine_id });
        }
        Ok(operator)
    }
}
