//! IDs for SignalR services and their child resources.

use super::{
    impl_resource_id_traits, ParsedSegments, ResourceId, Segment, RESOURCE_GROUP,
    SIGNALR_PROVIDER, SUBSCRIPTION,
};

const SIGNALR: Segment = Segment::user("SignalR", "signalRName", "Signal R Name");

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.SignalRService/SignalR/{signalRName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalRId {
    /// Subscription the service lives in.
    pub subscription_id: String,
    /// Resource group the service lives in.
    pub resource_group_name: String,
    /// Name of the SignalR service.
    pub signal_r_name: String,
}

impl SignalRId {
    /// Build an ID from its parts.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        signal_r_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            signal_r_name: signal_r_name.into(),
        }
    }
}

impl ResourceId for SignalRId {
    const TEMPLATE: &'static [Segment] = &[SUBSCRIPTION, RESOURCE_GROUP, SIGNALR_PROVIDER, SIGNALR];
    const DESCRIPTION: &'static str = "SignalR Service";

    fn from_segments(mut segments: ParsedSegments) -> Self {
        Self {
            subscription_id: segments.take("subscriptionId"),
            resource_group_name: segments.take("resourceGroupName"),
            signal_r_name: segments.take("signalRName"),
        }
    }

    fn segment_values(&self) -> Vec<&str> {
        vec![
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.signal_r_name.as_str(),
        ]
    }
}

impl_resource_id_traits!(SignalRId);

/// `.../SignalR/{signalRName}/customCertificates/{customCertificateName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomCertificateId {
    /// Subscription the service lives in.
    pub subscription_id: String,
    /// Resource group the service lives in.
    pub resource_group_name: String,
    /// Name of the parent SignalR service.
    pub signal_r_name: String,
    /// Name of the certificate.
    pub custom_certificate_name: String,
}

impl CustomCertificateId {
    /// Build an ID from its parts.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        signal_r_name: impl Into<String>,
        custom_certificate_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            signal_r_name: signal_r_name.into(),
            custom_certificate_name: custom_certificate_name.into(),
        }
    }

    /// The SignalR service owning this certificate.
    pub fn signalr_id(&self) -> SignalRId {
        SignalRId::new(
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.signal_r_name.as_str(),
        )
    }
}

impl ResourceId for CustomCertificateId {
    const TEMPLATE: &'static [Segment] = &[
        SUBSCRIPTION,
        RESOURCE_GROUP,
        SIGNALR_PROVIDER,
        SIGNALR,
        Segment::user(
            "customCertificates",
            "customCertificateName",
            "Custom Certificate Name",
        ),
    ];
    const DESCRIPTION: &'static str = "Custom Certificate";

    fn from_segments(mut segments: ParsedSegments) -> Self {
        Self {
            subscription_id: segments.take("subscriptionId"),
            resource_group_name: segments.take("resourceGroupName"),
            signal_r_name: segments.take("signalRName"),
            custom_certificate_name: segments.take("customCertificateName"),
        }
    }

    fn segment_values(&self) -> Vec<&str> {
        vec![
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.signal_r_name.as_str(),
            self.custom_certificate_name.as_str(),
        ]
    }
}

impl_resource_id_traits!(CustomCertificateId);

/// `.../SignalR/{signalRName}/customDomains/{customDomainName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomDomainId {
    /// Subscription the service lives in.
    pub subscription_id: String,
    /// Resource group the service lives in.
    pub resource_group_name: String,
    /// Name of the parent SignalR service.
    pub signal_r_name: String,
    /// Name of the custom domain.
    pub custom_domain_name: String,
}

impl CustomDomainId {
    /// Build an ID from its parts.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        signal_r_name: impl Into<String>,
        custom_domain_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            signal_r_name: signal_r_name.into(),
            custom_domain_name: custom_domain_name.into(),
        }
    }

    /// The SignalR service owning this domain.
    pub fn signalr_id(&self) -> SignalRId {
        SignalRId::new(
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.signal_r_name.as_str(),
        )
    }
}

impl ResourceId for CustomDomainId {
    const TEMPLATE: &'static [Segment] = &[
        SUBSCRIPTION,
        RESOURCE_GROUP,
        SIGNALR_PROVIDER,
        SIGNALR,
        Segment::user("customDomains", "customDomainName", "Custom Domain Name"),
    ];
    const DESCRIPTION: &'static str = "Custom Domain";

    fn from_segments(mut segments: ParsedSegments) -> Self {
        Self {
            subscription_id: segments.take("subscriptionId"),
            resource_group_name: segments.take("resourceGroupName"),
            signal_r_name: segments.take("signalRName"),
            custom_domain_name: segments.take("customDomainName"),
        }
    }

    fn segment_values(&self) -> Vec<&str> {
        vec![
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.signal_r_name.as_str(),
            self.custom_domain_name.as_str(),
        ]
    }
}

impl_resource_id_traits!(CustomDomainId);

/// `.../SignalR/{signalRName}/sharedPrivateLinkResources/{sharedPrivateLinkResourceName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SharedPrivateLinkResourceId {
    /// Subscription the service lives in.
    pub subscription_id: String,
    /// Resource group the service lives in.
    pub resource_group_name: String,
    /// Name of the parent SignalR service.
    pub signal_r_name: String,
    /// Name of the shared private link resource.
    pub shared_private_link_resource_name: String,
}

impl SharedPrivateLinkResourceId {
    /// Build an ID from its parts.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        signal_r_name: impl Into<String>,
        shared_private_link_resource_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            signal_r_name: signal_r_name.into(),
            shared_private_link_resource_name: shared_private_link_resource_name.into(),
        }
    }

    /// The SignalR service owning this link.
    pub fn signalr_id(&self) -> SignalRId {
        SignalRId::new(
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.signal_r_name.as_str(),
        )
    }
}

impl ResourceId for SharedPrivateLinkResourceId {
    const TEMPLATE: &'static [Segment] = &[
        SUBSCRIPTION,
        RESOURCE_GROUP,
        SIGNALR_PROVIDER,
        SIGNALR,
        Segment::user(
            "sharedPrivateLinkResources",
            "sharedPrivateLinkResourceName",
            "Shared Private Link Resource Name",
        ),
    ];
    const DESCRIPTION: &'static str = "Shared Private Link Resource";

    fn from_segments(mut segments: ParsedSegments) -> Self {
        Self {
            subscription_id: segments.take("subscriptionId"),
            resource_group_name: segments.take("resourceGroupName"),
            signal_r_name: segments.take("signalRName"),
            shared_private_link_resource_name: segments.take("sharedPrivateLinkResourceName"),
        }
    }

    fn segment_values(&self) -> Vec<&str> {
        vec![
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.signal_r_name.as_str(),
            self.shared_private_link_resource_name.as_str(),
        ]
    }
}

impl_resource_id_traits!(SharedPrivateLinkResourceId);
