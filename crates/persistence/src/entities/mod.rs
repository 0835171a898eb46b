//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Status columns come
//! back as text and are parsed into domain enums by the repositories.

pub mod activity_log;
pub mod equipment;
pub mod member;
pub mod notification;
pub mod payment;
pub mod reservation;
pub mod service;
pub mod subscription;
pub mod user;

pub use activity_log::ActivityLogEntity;
pub use equipment::EquipmentEntity;
pub use member::MemberEntity;
pub use notification::NotificationEntity;
pub use payment::PaymentEntity;
pub use reservation::{ReservationDetailsEntity, ReservationEntity};
pub use service::ServiceEntity;
pub use subscription::SubscriptionEntity;
pub use user::UserEntity;
