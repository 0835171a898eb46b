//! Repository implementations for database operations.

pub mod activity_log;
pub mod dashboard;
pub mod equipment;
pub mod member;
pub mod notification;
pub mod payment;
pub mod reservation;
pub mod service;
pub mod sort;
pub mod subscription;
pub mod user;

pub use activity_log::ActivityLogRepository;
pub use dashboard::DashboardRepository;
pub use equipment::{EquipmentInput, EquipmentListQuery, EquipmentRepository};
pub use member::{MemberInput, MemberListQuery, MemberRepository};
pub use notification::{NotificationInput, NotificationRepository};
pub use payment::{PaymentInput, PaymentListQuery, PaymentRepository, PaymentUpdate};
pub use reservation::{
    BookingError, ReservationInput, ReservationListQuery, ReservationRepository,
};
pub use service::{ServiceInput, ServiceRepository};
pub use sort::{SortDirection, SortParams};
pub use subscription::{SubscriptionInput, SubscriptionRepository};
pub use user::{UserInput, UserRepository, UserUpdate};
