mod admin_test;
mod appointments_test;
mod availability_test;
mod events_test;
mod middleware_test;
mod services_test;
