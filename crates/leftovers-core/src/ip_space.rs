//! IP space pass: allocations first, then the space

use leftovers_cloud::{AllocationKind, ApiVersion};

use crate::error::Result;
use crate::lister;
use crate::walker::Walker;

/// First API version exposing IP spaces
pub const MIN_IP_SPACE_VERSION: ApiVersion = ApiVersion::new(37, 1);

impl Walker<'_> {
    pub(crate) async fn sweep_ip_spaces(&mut self) -> Result<()> {
        let version = self.plane().api_version();
        if !version.at_least(MIN_IP_SPACE_VERSION) {
            self.skip(
                "IP spaces",
                format!(
                    "API version {} is older than {}",
                    version, MIN_IP_SPACE_VERSION
                ),
            );
            return Ok(());
        }

        for ip_space in lister::ip_spaces(self.plane()).await? {
            if !self.select(0, &ip_space).delete {
                continue;
            }
            for allocation in [AllocationKind::FloatingIp, AllocationKind::IpPrefix] {
                for listed in lister::ip_allocations(self.plane(), &ip_space, allocation).await? {
                    self.remove(1, &listed).await?;
                }
            }
            self.remove(0, &ip_space).await?;
        }
        Ok(())
    }
}
