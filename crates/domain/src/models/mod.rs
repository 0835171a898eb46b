//! Domain models.

pub mod activity_log;
pub mod dashboard;
pub mod entity_kind;
pub mod equipment;
pub mod member;
pub mod notification;
pub mod payment;
pub mod reservation;
pub mod service;
pub mod subscription;
pub mod user;

pub use activity_log::ActivityLog;
pub use dashboard::{AdminDashboard, CoachDashboard, Dashboard, ManagerDashboard};
pub use entity_kind::EntityKind;
pub use equipment::{Equipment, EquipmentStatus};
pub use member::{Member, MemberStats, MemberStatus};
pub use notification::Notification;
pub use payment::{
    FinancialStats, MethodRevenue, MonthlyRevenue, Payment, PaymentInvoice, PaymentMethod,
    PaymentStatus, StatusTotal,
};
pub use reservation::{Reservation, ReservationDetails, ReservationStats, ReservationStatus};
pub use service::Service;
pub use subscription::{Subscription, SubscriptionStatus, SubscriptionType};
pub use user::{Role, User};
